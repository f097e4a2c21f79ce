use serde::{Deserialize, Serialize};

use crate::loss::DEFAULT_SMALL_VALUE;
use crate::{LossFunction, LossResult};

/// Loss settings as stored alongside an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    /// Stored by canonical name, e.g. `"cross_entropy"`
    pub loss_function: LossFunction,

    /// Whether the loss function takes logits; inferred from the inputs when unset
    pub loss_function_using_logits: Option<bool>,

    /// Labels are multihot encoded
    pub multilabel_data: bool,

    /// Floor keeping logarithms finite
    pub small_value: f64,
}

impl Default for LossConfig {
    fn default() -> Self {
        LossConfig {
            loss_function: LossFunction::CrossEntropy,
            loss_function_using_logits: None,
            multilabel_data: false,
            small_value: DEFAULT_SMALL_VALUE,
        }
    }
}

impl LossConfig {
    pub fn from_json(json: &str) -> LossResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> LossResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
