use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

use crate::{LossError, LossResult};

/// The loss functions known to the resolver.
///
/// The canonical names (`"cross_entropy"`, `"squared"`) are what gets stored
/// in experiment configurations and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    CrossEntropy,
    Squared,
}

impl LossFunction {
    pub const ALL: [LossFunction; 2] = [LossFunction::CrossEntropy, LossFunction::Squared];

    /// Canonical name of the loss function
    pub fn as_str(&self) -> &'static str {
        match self {
            LossFunction::CrossEntropy => "cross_entropy",
            LossFunction::Squared => "squared",
        }
    }
}

impl fmt::Display for LossFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive lookup by canonical name.
impl FromStr for LossFunction {
    type Err = LossError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        LossFunction::ALL
            .into_iter()
            .find(|function| function.as_str() == name)
            .ok_or_else(|| LossError::UnknownLossFunction {
                name: name.to_string(),
            })
    }
}

/// Signature of a caller-supplied loss: `(labels, predictions) -> loss`.
pub type CustomLossFn =
    dyn Fn(ArrayViewD<'_, f64>, ArrayViewD<'_, f64>) -> LossResult<ArrayD<f64>> + Send + Sync;

/// Which loss the resolver should compute.
///
/// A name is only looked up when the resolver actually needs to compute a
/// loss, so an unknown name never fails a request that has nothing to score.
#[derive(Clone)]
pub enum LossSelector {
    Known(LossFunction),
    Named(String),
    Custom(Arc<CustomLossFn>),
}

pub(crate) enum ResolvedLoss<'a> {
    Known(LossFunction),
    Custom(&'a CustomLossFn),
}

impl LossSelector {
    pub fn custom<F>(function: F) -> Self
    where
        F: Fn(ArrayViewD<'_, f64>, ArrayViewD<'_, f64>) -> LossResult<ArrayD<f64>>
            + Send
            + Sync
            + 'static,
    {
        LossSelector::Custom(Arc::new(function))
    }

    pub(crate) fn resolve(&self) -> LossResult<ResolvedLoss<'_>> {
        match self {
            LossSelector::Known(function) => Ok(ResolvedLoss::Known(*function)),
            LossSelector::Named(name) => name.parse().map(ResolvedLoss::Known),
            LossSelector::Custom(function) => Ok(ResolvedLoss::Custom(function.as_ref())),
        }
    }
}

impl Default for LossSelector {
    fn default() -> Self {
        LossSelector::Known(LossFunction::CrossEntropy)
    }
}

impl fmt::Debug for LossSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossSelector::Known(function) => f.debug_tuple("Known").field(function).finish(),
            LossSelector::Named(name) => f.debug_tuple("Named").field(name).finish(),
            LossSelector::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<LossFunction> for LossSelector {
    fn from(function: LossFunction) -> Self {
        LossSelector::Known(function)
    }
}

impl From<&str> for LossSelector {
    fn from(name: &str) -> Self {
        LossSelector::Named(name.to_string())
    }
}

impl From<String> for LossSelector {
    fn from(name: String) -> Self {
        LossSelector::Named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for function in LossFunction::ALL {
            assert_eq!(function.as_str().parse::<LossFunction>().unwrap(), function);
            assert_eq!(function.to_string(), function.as_str());
        }
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        for name in ["", "Cross_Entropy", "CROSS_ENTROPY", "squared ", "crossentropy", "mse"] {
            match name.parse::<LossFunction>() {
                Err(LossError::UnknownLossFunction { name: rejected }) => assert_eq!(rejected, name),
                other => panic!("{:?} should be rejected, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        assert_eq!(
            serde_json::to_string(&LossFunction::CrossEntropy).unwrap(),
            "\"cross_entropy\""
        );
        let squared: LossFunction = serde_json::from_str("\"squared\"").unwrap();
        assert_eq!(squared, LossFunction::Squared);
        assert!(serde_json::from_str::<LossFunction>("\"Squared\"").is_err());
    }

    #[test]
    fn test_selector_resolution() {
        let named = LossSelector::from("squared");
        assert!(matches!(named.resolve(), Ok(ResolvedLoss::Known(LossFunction::Squared))));

        let unknown = LossSelector::from(String::from("hinge"));
        assert!(matches!(unknown.resolve(), Err(LossError::UnknownLossFunction { .. })));

        let custom = LossSelector::custom(|labels, _| Ok(labels.to_owned()));
        assert!(matches!(custom.resolve(), Ok(ResolvedLoss::Custom(_))));
        assert_eq!(format!("{:?}", custom), "Custom(..)");
    }
}
