//! Per-example losses used to score how confidently a model predicts its
//! training examples.
//!
//! The two cross-entropy flavours keep distinct stabilizations on purpose:
//! [`log_loss`] clamps the probability of the true class from below before
//! the logarithm, [`multilabel_bce_loss`] adds the floor inside each
//! logarithm. They give different values near 0 and 1.

use ndarray::{Array1, Array2, ArrayBase, ArrayD, ArrayView2, Axis, Data, Dimension, Ix2, Zip};

use crate::activation::{softmax, ActivationType};
use crate::utils::{binary_label, broadcast_shape, check_num_examples, class_index, is_effectively_1d};
use crate::{LossError, LossResult};

/// Floor used to keep logarithms finite.
pub const DEFAULT_SMALL_VALUE: f64 = 1e-8;

/// Per-example cross-entropy loss.
///
/// `predictions` of shape `(N,)` (or any shape holding one scalar per
/// example) are the positive-class probability of a binary problem, and
/// `labels` must then be 0 or 1. Predictions of shape `(N, C)` hold one class
/// distribution per row and labels must be class indices in `[0, C)`.
///
/// With `from_logits` the predictions are passed through a sigmoid (binary)
/// or a softmax over the class axis (categorical) first. The probability of
/// the true class is clipped below by `small_value` before taking `-ln`.
pub fn log_loss<S1, S2, D1, D2>(
    labels: &ArrayBase<S1, D1>,
    predictions: &ArrayBase<S2, D2>,
    from_logits: bool,
    small_value: f64,
) -> LossResult<Array1<f64>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let labels = labels.view().into_dyn();
    let predictions = predictions.view().into_dyn();
    check_num_examples(&labels, &predictions)?;
    if !is_effectively_1d(&labels) {
        return Err(LossError::InvalidShape {
            expected: "labels with one class id per example",
            actual: labels.shape().to_vec(),
        });
    }

    // Binary logistic loss
    if is_effectively_1d(&predictions) {
        let targets = labels
            .iter()
            .map(|&label| binary_label(label))
            .collect::<LossResult<Vec<bool>>>()?;
        let probs = if from_logits {
            ActivationType::Sigmoid.apply(&predictions)
        } else {
            predictions.to_owned()
        };

        return Ok(targets
            .iter()
            .zip(probs.iter())
            .map(|(&positive, &p)| {
                let p_correct = if positive { p } else { 1.0 - p };
                -clip_below(p_correct, small_value).ln()
            })
            .collect());
    }

    // Categorical cross-entropy
    let shape = predictions.shape().to_vec();
    let predictions: ArrayView2<'_, f64> =
        predictions
            .into_dimensionality::<Ix2>()
            .map_err(|_| LossError::InvalidShape {
                expected: "predictions of shape (N,) or (N, C)",
                actual: shape,
            })?;
    let num_classes = predictions.ncols();
    let classes = labels
        .iter()
        .map(|&label| class_index(label, num_classes))
        .collect::<LossResult<Vec<usize>>>()?;
    let probs = if from_logits {
        softmax(&predictions)
    } else {
        predictions.to_owned()
    };

    Ok(classes
        .iter()
        .zip(probs.rows())
        .map(|(&class, row)| -clip_below(row[class], small_value).ln())
        .collect())
}

/// Elementwise squared error `(y_true - y_pred)^2`, broadcasting both sides
/// the way NumPy does.
pub fn squared_loss<S1, S2, D1, D2>(
    y_true: &ArrayBase<S1, D1>,
    y_pred: &ArrayBase<S2, D2>,
) -> LossResult<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let incompatible = || LossError::IncompatibleShapes {
        lhs: y_true.shape().to_vec(),
        rhs: y_pred.shape().to_vec(),
    };
    let shape = broadcast_shape(y_true.shape(), y_pred.shape()).ok_or_else(incompatible)?;
    let y_true = y_true.broadcast(shape.clone()).ok_or_else(incompatible)?;
    let y_pred = y_pred.broadcast(shape).ok_or_else(incompatible)?;

    Ok(Zip::from(&y_true)
        .and(&y_pred)
        .map_collect(|&t, &p| (t - p).powi(2)))
}

/// Per-example, per-class binary cross-entropy for multi-label targets.
///
/// `labels` is an `(N, C)` multihot array and `predictions` the matching
/// logits or probabilities. Each entry is
/// `-(l * ln(p + small_value) + (1 - l) * ln(1 - p + small_value))`; the
/// result keeps the `(N, C)` shape, aggregation is left to the caller.
pub fn multilabel_bce_loss<S1, S2, D1, D2>(
    labels: &ArrayBase<S1, D1>,
    predictions: &ArrayBase<S2, D2>,
    from_logits: bool,
    small_value: f64,
) -> LossResult<Array2<f64>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
{
    let labels = labels.view().into_dyn();
    let predictions = predictions.view().into_dyn();
    check_num_examples(&labels, &predictions)?;

    let labels = to_matrix(labels.view(), "multihot labels of shape (N, C)")?;
    let predictions = to_matrix(predictions.view(), "predictions of shape (N, C)")?;
    if labels.shape() != predictions.shape() {
        return Err(LossError::IncompatibleShapes {
            lhs: labels.shape().to_vec(),
            rhs: predictions.shape().to_vec(),
        });
    }

    if let Some(&value) = labels.iter().find(|&&l| l != 0.0 && l != 1.0) {
        return Err(LossError::NotMultihot { value });
    }
    if looks_single_label(&labels) {
        tracing::info!(
            num_examples = labels.nrows(),
            num_classes = labels.ncols(),
            "labels are one-hot encoded single label; every example has at most one positive label"
        );
    }
    if !from_logits {
        if let Some(&value) = predictions.iter().find(|&&p| p < 0.0 || p > 1.0) {
            return Err(LossError::ProbabilityOutOfRange { value });
        }
    }

    let probs = if from_logits {
        predictions.mapv(crate::activation::sigmoid)
    } else {
        predictions.to_owned()
    };

    Ok(Zip::from(&labels).and(&probs).map_collect(|&l, &p| {
        -(l * (p + small_value).ln() + (1.0 - l) * (1.0 - p + small_value).ln())
    }))
}

/// True when every example has zero or one positive label.
pub(crate) fn looks_single_label(labels: &ArrayView2<'_, f64>) -> bool {
    labels
        .sum_axis(Axis(1))
        .iter()
        .all(|&s| s == 0.0 || s == 1.0)
}

// NaN passes through so the caller sees it in the output.
fn clip_below(p: f64, floor: f64) -> f64 {
    if p < floor {
        floor
    } else {
        p
    }
}

fn to_matrix<'a>(
    array: ndarray::ArrayViewD<'a, f64>,
    expected: &'static str,
) -> LossResult<ArrayView2<'a, f64>> {
    let actual = array.shape().to_vec();
    array
        .into_dimensionality::<Ix2>()
        .map_err(|_| LossError::InvalidShape { expected, actual })
}
