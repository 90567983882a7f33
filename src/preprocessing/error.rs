use std::fmt;

/// Failures raised while fitting or applying a scaler.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// Tensor dimensions do not match what the scaler expects.
    InvalidShape { expected: String, got: String },
    /// A scaler hyperparameter or stored parameter is unusable.
    InvalidParameter(String),
    /// Transform requested before `fit`; names the scaler.
    NotFitted(String),
    EmptyData(String),
    /// Column count differs from the one seen during `fit`.
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}

impl fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PreprocessingError::*;
        match self {
            InvalidShape { expected, got } => {
                write!(f, "Invalid shape: expected {}, got {}", expected, got)
            }
            InvalidParameter(msg) => write!(f, "Invalid scaler parameter: {}", msg),
            NotFitted(what) => write!(f, "{} is not fitted", what),
            EmptyData(msg) => write!(f, "Empty data: {}", msg),
            FeatureMismatch {
                expected_features,
                got_features,
            } => write!(
                f,
                "Scaler was fitted on {} columns, got {}",
                expected_features, got_features
            ),
        }
    }
}

impl std::error::Error for PreprocessingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = PreprocessingError::NotFitted("target scaler".to_string());
        assert_eq!(err.to_string(), "target scaler is not fitted");

        let err = PreprocessingError::FeatureMismatch {
            expected_features: 2,
            got_features: 3,
        };
        assert_eq!(err.to_string(), "Scaler was fitted on 2 columns, got 3");

        let err = PreprocessingError::InvalidShape {
            expected: "(n, 1)".to_string(),
            got: "(3, 2)".to_string(),
        };
        assert!(err.to_string().starts_with("Invalid shape"));
    }
}
