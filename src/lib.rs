mod activation;
mod config;
mod error;
mod loss;
mod loss_function;
mod resolver;
mod utils;

pub use activation::{sigmoid, softmax, ActivationType};
pub use config::LossConfig;
pub use error::{LossError, LossResult};
pub use loss::{log_loss, multilabel_bce_loss, squared_loss, DEFAULT_SMALL_VALUE};
pub use loss_function::{CustomLossFn, LossFunction, LossSelector};
pub use resolver::{get_loss, LossRequest, PredictionKind};
