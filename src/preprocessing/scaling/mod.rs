//! Min-max scaling for features and targets.

pub mod minmax;
pub mod pair;

pub use minmax::{FittedMinMaxScaler, MinMaxScaler, MinMaxScalerConfig, MinMaxScalerParams};
pub use pair::{ScalerPair, ScalerPairParams};
