//! Min-Max Scaler.
//!
//! Transforms features by scaling each column to a given range (default [0, 1]):
//! ```text
//! X_scaled = (X - X_min) / (X_max - X_min) * (max - min) + min
//! ```
//!
//! # Example
//! ```
//! use queuenet::backend::{CpuBackend, Tensor2D};
//! use queuenet::preprocessing::{FittedTransformer, MinMaxScaler, Transformer};
//!
//! let x = Tensor2D::<CpuBackend>::from_rows(&[[0.5, 10.0], [1.0, 5.0], [2.0, 8.0]]);
//! let (fitted, scaled) = MinMaxScaler::<CpuBackend>::new().fit_transform(&x).unwrap();
//! let col = scaled.column(0).to_vec();
//! assert_eq!(col[0], 0.0);
//! assert!((col[2] - 1.0).abs() < 1e-12);
//!
//! let back = fitted.inverse_transform(&scaled).unwrap();
//! assert!((back.to_vec()[1] - 10.0).abs() < 1e-12);
//! ```

use crate::backend::{Backend, Scalar, Tensor1D, Tensor2D};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Target range of a [`MinMaxScaler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScalerConfig {
    pub min: f64,
    pub max: f64,
}

impl Default for MinMaxScalerConfig {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Serializable parameters for a fitted MinMaxScaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScalerParams {
    pub config: MinMaxScalerConfig,
    /// Minimum of each feature.
    pub min_: Vec<f64>,
    /// Maximum of each feature.
    pub max_: Vec<f64>,
    /// `(max - min) / (feature_max - feature_min)`, or `1.0` for constant features.
    pub scale_: Vec<f64>,
    pub n_features: usize,
}

/// MinMaxScaler transformer (unfitted).
#[derive(Debug, Clone)]
pub struct MinMaxScaler<B: Backend> {
    config: MinMaxScalerConfig,
    _backend: PhantomData<B>,
}

impl<B: Backend> Default for MinMaxScaler<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> MinMaxScaler<B> {
    /// Create a new MinMaxScaler with default range [0, 1].
    pub fn new() -> Self {
        Self {
            config: MinMaxScalerConfig::default(),
            _backend: PhantomData,
        }
    }

    /// Set the target range for scaling. Checked at fit time.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.config.min = min;
        self.config.max = max;
        self
    }
}

impl<B: Backend> Transformer<B> for MinMaxScaler<B> {
    type Input = Tensor2D<B>;
    type Output = Tensor2D<B>;
    type Params = MinMaxScalerParams;
    type Fitted = FittedMinMaxScaler<B>;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        let (rows, cols) = data.shape();

        if !(self.config.min.is_finite() && self.config.max.is_finite())
            || self.config.max <= self.config.min
        {
            return Err(PreprocessingError::InvalidParameter(format!(
                "target range [{}, {}] must be finite with max > min",
                self.config.min, self.config.max
            )));
        }
        if rows == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit MinMaxScaler on empty data".to_string(),
            ));
        }

        let min_ = data.col_min();
        let max_ = data.col_max();

        let target_range = self.config.max - self.config.min;
        let scale_vals: Vec<f64> = min_
            .to_vec()
            .iter()
            .zip(max_.to_vec().iter())
            .map(|(&min, &max)| {
                let range = max - min;
                if range == 0.0 {
                    1.0
                } else {
                    target_range / range
                }
            })
            .collect();

        Ok(FittedMinMaxScaler {
            config: self.config.clone(),
            min_,
            max_,
            scale_: Tensor1D::new(scale_vals),
            n_features: cols,
        })
    }
}

/// Fitted MinMaxScaler ready for inference.
#[derive(Debug, Clone)]
pub struct FittedMinMaxScaler<B: Backend> {
    config: MinMaxScalerConfig,
    min_: Tensor1D<B>,
    max_: Tensor1D<B>,
    scale_: Tensor1D<B>,
    n_features: usize,
}

impl<B: Backend> FittedMinMaxScaler<B> {
    /// Per-feature minimum seen during fit.
    pub fn min(&self) -> &Tensor1D<B> {
        &self.min_
    }

    /// Per-feature maximum seen during fit.
    pub fn max(&self) -> &Tensor1D<B> {
        &self.max_
    }

    pub fn scale(&self) -> &Tensor1D<B> {
        &self.scale_
    }

    /// `max - min` for each feature.
    pub fn data_range(&self) -> Tensor1D<B> {
        self.max_.sub(&self.min_)
    }

    fn check_features(&self, data: &Tensor2D<B>) -> Result<(), PreprocessingError> {
        let cols = data.cols();
        if cols != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: cols,
            });
        }
        Ok(())
    }
}

impl<B: Backend> FittedTransformer<B> for FittedMinMaxScaler<B> {
    type Input = Tensor2D<B>;
    type Output = Tensor2D<B>;
    type Params = MinMaxScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.check_features(data)?;

        // X_scaled = (X - X_min) * scale_ + target_min
        let centered = B::broadcast_sub_1d_to_2d_rows(&data.data, &self.min_.data);
        let scaled = Tensor2D::wrap(B::broadcast_mul_1d_to_2d_rows(&centered, &self.scale_.data));
        Ok(scaled.add_scalar(&Scalar::new(self.config.min)))
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError> {
        self.check_features(data)?;

        // X = (X_scaled - target_min) / scale_ + X_min
        let centered = data.add_scalar(&Scalar::new(-self.config.min));
        let unscaled = B::broadcast_div_1d_to_2d_rows(&centered.data, &self.scale_.data);
        Ok(Tensor2D::wrap(unscaled).add_row_vector(&self.min_))
    }

    fn extract_params(&self) -> Self::Params {
        MinMaxScalerParams {
            config: self.config.clone(),
            min_: self.min_.to_vec(),
            max_: self.max_.to_vec(),
            scale_: self.scale_.to_vec(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let n = params.n_features;
        if params.min_.len() != n || params.max_.len() != n || params.scale_.len() != n {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} values per parameter", n),
                got: format!(
                    "min {}, max {}, scale {}",
                    params.min_.len(),
                    params.max_.len(),
                    params.scale_.len()
                ),
            });
        }
        if params.scale_.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(PreprocessingError::InvalidParameter(
                "scale factors must be finite and non-zero".to_string(),
            ));
        }

        Ok(Self {
            config: params.config,
            min_: Tensor1D::new(params.min_),
            max_: Tensor1D::new(params.max_),
            scale_: Tensor1D::new(params.scale_),
            n_features: n,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::serialization::SerializableParams;

    fn create_test_data() -> Tensor2D<CpuBackend> {
        // [[0, 1], [0, 1], [1, 3]]
        Tensor2D::new(vec![0.0, 1.0, 0.0, 1.0, 1.0, 3.0], 3, 2)
    }

    #[test]
    fn test_minmax_scaler_fit() {
        let data = create_test_data();
        let fitted = MinMaxScaler::<CpuBackend>::new().fit(&data).unwrap();

        assert_eq!(fitted.min().to_vec(), vec![0.0, 1.0]);
        assert_eq!(fitted.max().to_vec(), vec![1.0, 3.0]);

        // (1 - 0) / (1 - 0) = 1, (1 - 0) / (3 - 1) = 0.5
        let scale = fitted.scale().to_vec();
        assert!((scale[0] - 1.0).abs() < 1e-12);
        assert!((scale[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_minmax_scaler_fit_transform() {
        let data = create_test_data();
        let (fitted, transformed) = MinMaxScaler::<CpuBackend>::new().fit_transform(&data).unwrap();
        assert_eq!(transformed.to_vec(), vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(fitted.n_features_in(), 2);
    }

    #[test]
    fn test_minmax_scaler_transform_does_not_refit() {
        let data = create_test_data();
        let fitted = MinMaxScaler::<CpuBackend>::new().fit(&data).unwrap();

        // Values outside the fitted range extrapolate linearly.
        let unseen = Tensor2D::<CpuBackend>::new(vec![2.0, 5.0], 1, 2);
        assert_eq!(fitted.transform(&unseen).unwrap().to_vec(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_minmax_scaler_inverse_transform() {
        let data = Tensor2D::<CpuBackend>::new(vec![0.5, 10.0, 1.0, 5.0, 2.0, 8.0, 0.1, 2.0], 4, 2);
        let (fitted, transformed) = MinMaxScaler::<CpuBackend>::new().fit_transform(&data).unwrap();
        let recovered = fitted.inverse_transform(&transformed).unwrap();

        for (o, r) in data.to_vec().iter().zip(recovered.to_vec().iter()) {
            assert!((o - r).abs() < 1e-9, "Expected {}, got {}", o, r);
        }
    }

    #[test]
    fn test_minmax_scaler_custom_range() {
        let data = create_test_data();
        let scaler = MinMaxScaler::<CpuBackend>::new().with_range(-1.0, 1.0);
        let (_, transformed) = scaler.fit_transform(&data).unwrap();
        assert_eq!(transformed.to_vec(), vec![-1.0, -1.0, -1.0, -1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_minmax_scaler_invalid_range() {
        let data = create_test_data();
        let scaler = MinMaxScaler::<CpuBackend>::new().with_range(1.0, 1.0);
        assert!(matches!(
            scaler.fit(&data),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_minmax_scaler_params_roundtrip() {
        let data = create_test_data();
        let fitted = MinMaxScaler::<CpuBackend>::new().fit(&data).unwrap();

        let params = fitted.extract_params();
        let restored = FittedMinMaxScaler::<CpuBackend>::from_params(params.clone()).unwrap();

        assert_eq!(restored.extract_params(), params);
        assert_eq!(
            fitted.transform(&data).unwrap().to_vec(),
            restored.transform(&data).unwrap().to_vec()
        );
    }

    #[test]
    fn test_minmax_scaler_from_params_rejects_bad_lengths() {
        let params = MinMaxScalerParams {
            config: MinMaxScalerConfig::default(),
            min_: vec![0.0],
            max_: vec![1.0, 2.0],
            scale_: vec![1.0, 0.5],
            n_features: 2,
        };
        assert!(matches!(
            FittedMinMaxScaler::<CpuBackend>::from_params(params),
            Err(PreprocessingError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_minmax_scaler_feature_mismatch() {
        let fitted = MinMaxScaler::<CpuBackend>::new()
            .fit(&create_test_data())
            .unwrap();

        let wrong_data = Tensor2D::<CpuBackend>::new(vec![1.0, 2.0, 3.0], 1, 3);
        assert!(matches!(
            fitted.transform(&wrong_data),
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
        assert!(matches!(
            fitted.inverse_transform(&wrong_data),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_minmax_scaler_empty_data() {
        let data = Tensor2D::<CpuBackend>::zeros(0, 2);
        let result = MinMaxScaler::<CpuBackend>::new().fit(&data);
        assert!(matches!(result, Err(PreprocessingError::EmptyData(_))));
    }

    #[test]
    fn test_minmax_scaler_params_survive_bytes() {
        let data = create_test_data();
        let fitted = MinMaxScaler::<CpuBackend>::new().fit(&data).unwrap();

        let bytes = fitted.extract_params().to_bytes().unwrap();
        let params = MinMaxScalerParams::from_bytes(&bytes).unwrap();
        let loaded = FittedMinMaxScaler::<CpuBackend>::from_params(params).unwrap();
        assert_eq!(loaded.n_features_in(), 2);
        assert_eq!(
            fitted.transform(&data).unwrap().to_vec(),
            loaded.transform(&data).unwrap().to_vec()
        );
    }

    #[test]
    fn test_minmax_scaler_data_range() {
        let fitted = MinMaxScaler::<CpuBackend>::new()
            .fit(&create_test_data())
            .unwrap();
        assert_eq!(fitted.data_range().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_minmax_scaler_zero_range() {
        let data = Tensor2D::<CpuBackend>::new(vec![5.0, 5.0, 5.0, 5.0], 2, 2);
        let (fitted, transformed) = MinMaxScaler::<CpuBackend>::new().fit_transform(&data).unwrap();

        // Constant columns map to the lower bound and invert back exactly.
        assert!(transformed.to_vec().iter().all(|&v| v == 0.0));
        assert_eq!(fitted.inverse_transform(&transformed).unwrap().to_vec(), data.to_vec());
    }
}
