use std::fmt;

use ndarray::{ArrayView, ArrayViewD, CowArray, Dimension, IxDyn};

use crate::config::LossConfig;
use crate::loss::{log_loss, multilabel_bce_loss, squared_loss, DEFAULT_SMALL_VALUE};
use crate::loss_function::{LossSelector, ResolvedLoss};
use crate::{LossError, LossFunction, LossResult};

/// What a prediction array holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionKind {
    Logits,
    Probabilities,
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionKind::Logits => f.write_str("logits"),
            PredictionKind::Probabilities => f.write_str("probabilities"),
        }
    }
}

/// Everything the resolver may know about a set of examples.
///
/// All arrays are borrowed; a precomputed `loss` comes back out of
/// [`get_loss`] as the very same borrowed data.
#[derive(Debug, Clone)]
pub struct LossRequest<'a> {
    pub loss: Option<ArrayViewD<'a, f64>>,
    pub labels: Option<ArrayViewD<'a, f64>>,
    pub logits: Option<ArrayViewD<'a, f64>>,
    pub probs: Option<ArrayViewD<'a, f64>>,
    pub loss_function: LossSelector,
    /// Whether `loss_function` takes logits. When unset, it takes logits if
    /// logits were supplied.
    pub loss_function_using_logits: Option<bool>,
    pub multilabel_data: bool,
    pub small_value: f64,
}

impl Default for LossRequest<'_> {
    fn default() -> Self {
        LossRequest {
            loss: None,
            labels: None,
            logits: None,
            probs: None,
            loss_function: LossSelector::default(),
            loss_function_using_logits: None,
            multilabel_data: false,
            small_value: DEFAULT_SMALL_VALUE,
        }
    }
}

impl<'a> LossRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request carrying the loss settings of an experiment configuration
    pub fn from_config(config: &LossConfig) -> Self {
        LossRequest {
            loss_function: LossSelector::Known(config.loss_function),
            loss_function_using_logits: config.loss_function_using_logits,
            multilabel_data: config.multilabel_data,
            small_value: config.small_value,
            ..Self::default()
        }
    }

    pub fn with_loss<D: Dimension>(mut self, loss: ArrayView<'a, f64, D>) -> Self {
        self.loss = Some(loss.into_dyn());
        self
    }

    pub fn with_labels<D: Dimension>(mut self, labels: ArrayView<'a, f64, D>) -> Self {
        self.labels = Some(labels.into_dyn());
        self
    }

    pub fn with_logits<D: Dimension>(mut self, logits: ArrayView<'a, f64, D>) -> Self {
        self.logits = Some(logits.into_dyn());
        self
    }

    pub fn with_probs<D: Dimension>(mut self, probs: ArrayView<'a, f64, D>) -> Self {
        self.probs = Some(probs.into_dyn());
        self
    }

    pub fn with_loss_function(mut self, loss_function: impl Into<LossSelector>) -> Self {
        self.loss_function = loss_function.into();
        self
    }

    pub fn using_logits(mut self, using_logits: bool) -> Self {
        self.loss_function_using_logits = Some(using_logits);
        self
    }

    pub fn multilabel(mut self, multilabel_data: bool) -> Self {
        self.multilabel_data = multilabel_data;
        self
    }

    pub fn with_small_value(mut self, small_value: f64) -> Self {
        self.small_value = small_value;
        self
    }

    /// Shorthand for [`get_loss`].
    pub fn get_loss(&self) -> LossResult<Option<CowArray<'a, f64, IxDyn>>> {
        get_loss(self)
    }
}

/// Returns the per-example loss, computing it if needed.
///
/// In order:
/// 1. a precomputed `loss` is returned as is, nothing else is looked at;
/// 2. without labels, or without both logits and probabilities, there is no
///    loss and `Ok(None)` is returned;
/// 3. the predictions the loss function expects must be present;
/// 4. a named loss function is looked up;
/// 5. cross-entropy dispatches to [`multilabel_bce_loss`] or [`log_loss`]
///    depending on `multilabel_data`, squared to [`squared_loss`], and a
///    custom function is called with `(labels, predictions)`.
pub fn get_loss<'a>(request: &LossRequest<'a>) -> LossResult<Option<CowArray<'a, f64, IxDyn>>> {
    if let Some(loss) = &request.loss {
        tracing::debug!(shape = ?loss.shape(), "using precomputed loss");
        return Ok(Some(CowArray::from(loss.clone())));
    }
    let labels = match &request.labels {
        Some(labels) if request.logits.is_some() || request.probs.is_some() => labels,
        _ => {
            tracing::debug!("no loss available: labels or predictions are missing");
            return Ok(None);
        }
    };

    let using_logits = request
        .loss_function_using_logits
        .unwrap_or(request.logits.is_some());
    let predictions = if using_logits {
        request.logits.as_ref().ok_or(LossError::MissingPredictions {
            kind: PredictionKind::Logits,
        })?
    } else {
        request.probs.as_ref().ok_or(LossError::MissingPredictions {
            kind: PredictionKind::Probabilities,
        })?
    };

    let loss = match request.loss_function.resolve()? {
        ResolvedLoss::Known(function) => {
            tracing::debug!(
                loss_function = %function,
                using_logits,
                multilabel_data = request.multilabel_data,
                "computing loss"
            );
            match function {
                LossFunction::CrossEntropy if request.multilabel_data => {
                    multilabel_bce_loss(labels, predictions, using_logits, request.small_value)?
                        .into_dyn()
                }
                LossFunction::CrossEntropy => {
                    log_loss(labels, predictions, using_logits, request.small_value)?.into_dyn()
                }
                LossFunction::Squared => squared_loss(labels, predictions)?,
            }
        }
        ResolvedLoss::Custom(function) => {
            tracing::debug!(using_logits, "computing loss with a custom function");
            function(labels.view(), predictions.view())?
        }
    };
    Ok(Some(CowArray::from(loss)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD};

    #[test]
    fn test_precomputed_loss_short_circuits() {
        let loss = array![0.5, 1.5];
        // nonsense labels and an unknown selector are never looked at
        let labels = array![7.0, 8.0, 9.0];
        let request = LossRequest::new()
            .with_loss(loss.view())
            .with_labels(labels.view())
            .with_loss_function("hinge");

        let resolved = request.get_loss().unwrap().unwrap();
        assert!(resolved.is_view());
        assert_eq!(resolved.as_ptr(), loss.as_ptr());
        assert_eq!(resolved, loss.view().into_dyn());
    }

    #[test]
    fn test_unavailable_before_selector_lookup() {
        let labels = array![0.0, 1.0];
        let request = LossRequest::new()
            .with_labels(labels.view())
            .with_loss_function("hinge");

        assert!(request.get_loss().unwrap().is_none());
    }

    #[test]
    fn test_using_logits_inferred_from_inputs() {
        let labels = array![1.0];
        let logits = array![0.0];
        let request = LossRequest::new()
            .with_labels(labels.view())
            .with_logits(logits.view());

        let loss = request.get_loss().unwrap().unwrap();
        assert!((loss[[0]] - (2.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_predictions() {
        let labels = array![1.0];
        let probs = array![0.5];
        let request = LossRequest::new()
            .with_labels(labels.view())
            .with_probs(probs.view())
            .using_logits(true);

        assert!(matches!(
            request.get_loss(),
            Err(LossError::MissingPredictions { kind: PredictionKind::Logits })
        ));
    }

    #[test]
    fn test_small_value_is_threaded_through() {
        let labels = array![1.0];
        let probs = array![0.0];
        let request = LossRequest::new()
            .with_labels(labels.view())
            .with_probs(probs.view())
            .with_small_value(1e-4);

        let loss: ArrayD<f64> = request.get_loss().unwrap().unwrap().into_owned();
        assert!((loss[[0]] + (1e-4f64).ln()).abs() < 1e-12);
    }
}
