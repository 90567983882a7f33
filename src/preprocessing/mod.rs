//! Data preprocessing transformers.
//!
//! Transformers follow a type-state split: an unfitted [`Transformer`] holds
//! hyperparameters and learns from data, producing a [`FittedTransformer`] that
//! can transform new data, invert the transform and be serialized.
//!
//! The network wrapper uses a [`ScalerPair`]: one [`MinMaxScaler`] over the
//! feature matrix and one over the target.

pub mod error;
pub mod scaling;
pub mod traits;

pub use error::PreprocessingError;
pub use scaling::{
    FittedMinMaxScaler, MinMaxScaler, MinMaxScalerConfig, MinMaxScalerParams, ScalerPair,
    ScalerPairParams,
};
pub use traits::{FittedTransformer, Transformer};
