use ndarray::ArrayViewD;

use crate::{LossError, LossResult};

/// Number of examples in an array, i.e. the length of its first axis.
pub fn num_examples(array: &ArrayViewD<'_, f64>) -> LossResult<usize> {
    array.shape().first().copied().ok_or_else(|| LossError::InvalidShape {
        expected: "an array with at least one axis",
        actual: array.shape().to_vec(),
    })
}

/// Fails unless labels and predictions hold the same number of examples.
pub fn check_num_examples(
    labels: &ArrayViewD<'_, f64>,
    predictions: &ArrayViewD<'_, f64>,
) -> LossResult<usize> {
    let n_labels = num_examples(labels)?;
    let n_predictions = num_examples(predictions)?;
    if n_labels != n_predictions {
        return Err(LossError::ShapeMismatch {
            labels: n_labels,
            predictions: n_predictions,
        });
    }
    Ok(n_labels)
}

/// One scalar per example: `(N,)`, `(N, 1)`, `(N, 1, 1)` and so on.
pub fn is_effectively_1d(array: &ArrayViewD<'_, f64>) -> bool {
    array.ndim() > 0 && array.len() == array.shape()[0]
}

/// Binary label as a bool, rejecting anything but exactly 0 or 1.
pub fn binary_label(value: f64) -> LossResult<bool> {
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(LossError::NonBinaryLabel { value })
    }
}

/// Categorical label as an index into `[0, num_classes)`.
pub fn class_index(value: f64, num_classes: usize) -> LossResult<usize> {
    if value.fract() != 0.0 || value < 0.0 || value >= num_classes as f64 {
        return Err(LossError::LabelOutOfRange { value, num_classes });
    }
    Ok(value as usize)
}

/// Shape both operands broadcast to, following NumPy rules (trailing axes
/// aligned, size-1 axes stretched). `None` when the shapes are incompatible.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
    let ndim = lhs.len().max(rhs.len());
    let mut shape = vec![0; ndim];
    for (i, dim) in shape.iter_mut().enumerate() {
        // axis i counted from the right
        let l = lhs.len().checked_sub(ndim - i).map_or(1, |j| lhs[j]);
        let r = rhs.len().checked_sub(ndim - i).map_or(1, |j| rhs[j]);
        *dim = match (l, r) {
            (l, r) if l == r => l,
            (1, r) => r,
            (l, 1) => l,
            _ => return None,
        };
    }
    Some(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, array, Array3};

    #[test]
    fn test_num_examples() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]].into_dyn();
        assert_eq!(num_examples(&a.view()).unwrap(), 3);

        let scalar = arr0(1.0).into_dyn();
        assert!(matches!(
            num_examples(&scalar.view()),
            Err(LossError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_check_num_examples_mismatch() {
        let labels = array![0.0, 1.0, 1.0].into_dyn();
        let predictions = array![0.1, 0.2, 0.3, 0.4].into_dyn();

        match check_num_examples(&labels.view(), &predictions.view()) {
            Err(LossError::ShapeMismatch { labels, predictions }) => {
                assert_eq!((labels, predictions), (3, 4));
            }
            other => panic!("expected a shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_is_effectively_1d() {
        assert!(is_effectively_1d(&array![0.1, 0.2].into_dyn().view()));
        assert!(is_effectively_1d(&array![[0.1], [0.2]].into_dyn().view()));
        assert!(is_effectively_1d(&Array3::<f64>::zeros((4, 1, 1)).into_dyn().view()));
        assert!(!is_effectively_1d(&array![[0.1, 0.9]].into_dyn().view()));
        assert!(!is_effectively_1d(&arr0(0.5).into_dyn().view()));
    }

    #[test]
    fn test_label_domains() {
        assert!(!binary_label(0.0).unwrap());
        assert!(binary_label(1.0).unwrap());
        assert!(binary_label(2.0).is_err());

        assert_eq!(class_index(2.0, 3).unwrap(), 2);
        assert!(class_index(3.0, 3).is_err());
        assert!(class_index(-1.0, 3).is_err());
        assert!(class_index(0.5, 3).is_err());
    }

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[3], &[3]), Some(vec![3]));
        assert_eq!(broadcast_shape(&[3], &[1]), Some(vec![3]));
        assert_eq!(broadcast_shape(&[3], &[2, 1]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[], &[4]), Some(vec![4]));
        assert_eq!(broadcast_shape(&[3], &[4]), None);
    }
}
