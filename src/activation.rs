use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMut1, Axis};

/// Conversion applied to logits to turn them into probabilities
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationType {
    /// Elementwise logistic function, used for binary and multi-label outputs.
    Sigmoid,
    /// Normalized exponential over the last (class) axis.
    Softmax,
}

impl ActivationType {
    /// Applies the activation to every element (sigmoid) or every class lane (softmax)
    pub fn apply(&self, logits: &ArrayViewD<'_, f64>) -> ArrayD<f64> {
        match self {
            ActivationType::Sigmoid => logits.mapv(sigmoid),
            ActivationType::Softmax => {
                let mut probs = logits.to_owned();
                if let Some(class_axis) = probs.ndim().checked_sub(1) {
                    for lane in probs.lanes_mut(Axis(class_axis)) {
                        normalize_exp(lane);
                    }
                }
                probs
            }
        }
    }
}

/// Logistic sigmoid, split on the sign of `x` so `exp` never overflows.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Row-wise softmax of an `(N, C)` array.
pub fn softmax(logits: &ArrayView2<'_, f64>) -> Array2<f64> {
    let mut probs = logits.to_owned();
    for row in probs.rows_mut() {
        normalize_exp(row);
    }
    probs
}

fn normalize_exp(mut lane: ArrayViewMut1<'_, f64>) {
    // shift by the max so the largest exponent is 0
    let max = lane.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    lane.mapv_inplace(|x| (x - max).exp());
    let sum = lane.sum();
    lane.mapv_inplace(|x| x / sum);
}
