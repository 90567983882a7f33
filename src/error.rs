//! Error type for training, prediction, persistence and the experiment driver.

use crate::preprocessing::PreprocessingError;
use std::fmt;

#[derive(Debug)]
pub enum ModelError {
    /// `predict`, `evaluate` or `save` was called before `train`.
    NotFitted(String),
    /// Empty input where at least one row was required.
    EmptyData(String),
    /// Feature rows and targets (or predictions and targets) differ in length.
    LengthMismatch { expected: usize, got: usize },
    /// A partition would be left without samples.
    InsufficientData(String),
    /// A configuration value is out of range.
    InvalidConfig(String),
    Preprocessing(PreprocessingError),
    /// Artifact or configuration could not be encoded or decoded.
    Serialization(String),
    Io(std::io::Error),
    Csv(csv::Error),
    /// A required CSV column is absent from the header.
    MissingColumn(String),
    /// Rendering a chart failed.
    Plot(String),
    /// A dataset could not produce a batch.
    Dataset(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotFitted(msg) => write!(f, "Model not trained yet: {}", msg),
            ModelError::EmptyData(msg) => write!(f, "Empty data: {}", msg),
            ModelError::LengthMismatch { expected, got } => {
                write!(f, "Length mismatch: expected {} values, got {}", expected, got)
            }
            ModelError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            ModelError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ModelError::Preprocessing(err) => write!(f, "Preprocessing error: {}", err),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Io(err) => write!(f, "I/O error: {}", err),
            ModelError::Csv(err) => write!(f, "CSV error: {}", err),
            ModelError::MissingColumn(name) => write!(f, "Missing column: {}", name),
            ModelError::Plot(msg) => write!(f, "Plot error: {}", msg),
            ModelError::Dataset(msg) => write!(f, "Data error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Preprocessing(err) => Some(err),
            ModelError::Io(err) => Some(err),
            ModelError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PreprocessingError> for ModelError {
    fn from(err: PreprocessingError) -> Self {
        match err {
            PreprocessingError::NotFitted(msg) => ModelError::NotFitted(msg),
            other => ModelError::Preprocessing(other),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err)
    }
}

impl From<bincode::Error> for ModelError {
    fn from(err: bincode::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ModelError {
    fn from(err: csv::Error) -> Self {
        ModelError::Csv(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
