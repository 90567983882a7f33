//! Serialization of fitted parameters.
//!
//! Scaler parameters, network parameters and the combined model artifact are
//! plain data (`Vec<f64>`, scalars, configuration) and never hold backend
//! tensors, so the same bytes load into any backend.

/// Parameter representations that can be serialized to and from bytes.
///
/// Blanket-implemented through `bincode` for every serde type.
pub trait SerializableParams: Sized {
    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        weights: Vec<f64>,
        tag: String,
    }

    #[test]
    fn test_bytes_roundtrip() {
        let s = Sample {
            weights: vec![0.25, -1.5],
            tag: "layer0".to_string(),
        };
        let bytes = s.to_bytes().unwrap();
        assert_eq!(Sample::from_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let s = Sample {
            weights: vec![1.0; 4],
            tag: "x".to_string(),
        };
        let bytes = s.to_bytes().unwrap();
        assert!(Sample::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
