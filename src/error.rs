use std::error::Error as StdError;

use thiserror::Error;

use crate::PredictionKind;

/// Errors raised while validating inputs or computing per-example losses.
///
/// Every variant is a fail-fast validation failure; no partial loss array is
/// ever returned alongside one.
#[derive(Error, Debug)]
pub enum LossError {
    /// Labels and predictions disagree on the number of examples.
    #[error("labels and predictions should have the same number of examples, but got {labels} and {predictions}")]
    ShapeMismatch {
        /// Leading dimension of the labels.
        labels: usize,
        /// Leading dimension of the predictions.
        predictions: usize,
    },

    /// An array has a rank the loss function cannot work with.
    #[error("invalid array shape: expected {expected}, got {actual:?}")]
    InvalidShape {
        /// Human readable description of the accepted shapes.
        expected: &'static str,
        /// The shape that was supplied.
        actual: Vec<usize>,
    },

    /// Two arrays could not be broadcast together.
    #[error("arrays with shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    IncompatibleShapes { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Predictions hold one scalar per example, so labels must be 0 or 1.
    #[error("each prediction is a scalar, so labels are expected to be in {{0, 1}}, but got {value}")]
    NonBinaryLabel { value: f64 },

    /// A categorical label is not a class index.
    #[error("labels should be in the range [0, {num_classes}), but got {value}")]
    LabelOutOfRange { value: f64, num_classes: usize },

    /// Multi-label targets must be multihot encoded.
    #[error("labels should be in {{0, 1}}; multi-label targets must be multihot encoded, but got {value}")]
    NotMultihot { value: f64 },

    /// Probabilities outside `[0, 1]` while the caller claims they are not logits.
    #[error("prediction probabilities are not in [0, 1] and predictions are not logits: got {value}")]
    ProbabilityOutOfRange { value: f64 },

    /// The selected loss function needs an input that was not supplied.
    #[error("{kind} are needed to compute the loss, but none were supplied")]
    MissingPredictions { kind: PredictionKind },

    /// A string selector that names no known loss function.
    #[error("{name} is not a valid loss function name")]
    UnknownLossFunction { name: String },

    /// Failure reported by a caller-supplied loss function.
    #[error("custom loss function failed")]
    Custom(#[source] Box<dyn StdError + Send + Sync>),

    /// Loss configuration could not be parsed or written.
    #[error("invalid loss configuration")]
    Config(#[from] serde_json::Error),
}

/// A specialized `Result` type for loss computations.
pub type LossResult<T> = Result<T, LossError>;
