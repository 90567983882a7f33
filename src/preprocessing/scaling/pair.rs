//! Feature/target scaler pair.

use crate::backend::{Backend, Tensor1D, Tensor2D};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::scaling::minmax::{FittedMinMaxScaler, MinMaxScaler, MinMaxScalerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};

/// Serializable state of a fitted [`ScalerPair`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerPairParams {
    pub features: MinMaxScalerParams,
    pub target: MinMaxScalerParams,
}

/// Two independent min-max scalers: one over the feature matrix, one over the
/// scalar target.
///
/// Both are fitted together by [`ScalerPair::fit_transform`]. Every other
/// transform fails with [`PreprocessingError::NotFitted`] until then.
///
/// # Example
/// ```
/// use queuenet::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use queuenet::preprocessing::ScalerPair;
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[[0.5, 10.0], [1.0, 5.0], [2.0, 8.0]]);
/// let y = Tensor1D::<CpuBackend>::new(vec![20.0, 5.0, 4.0]);
///
/// let mut pair = ScalerPair::<CpuBackend>::new();
/// assert!(pair.transform_features(&x).is_err());
///
/// let (_, y_scaled) = pair.fit_transform(&x, &y).unwrap();
/// assert_eq!(y_scaled.to_vec(), vec![1.0, 0.0625, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ScalerPair<B: Backend> {
    features: Option<FittedMinMaxScaler<B>>,
    target: Option<FittedMinMaxScaler<B>>,
}

impl<B: Backend> Default for ScalerPair<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> ScalerPair<B> {
    /// An unfitted pair.
    pub fn new() -> Self {
        Self {
            features: None,
            target: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.features.is_some() && self.target.is_some()
    }

    /// Fits both scalers into `[0, 1]` and returns the scaled data.
    ///
    /// Refitting replaces the previous state. On error the pair is left
    /// untouched.
    pub fn fit_transform(
        &mut self,
        x: &Tensor2D<B>,
        y: &Tensor1D<B>,
    ) -> Result<(Tensor2D<B>, Tensor1D<B>), PreprocessingError> {
        if x.rows() != y.len() {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} target values", x.rows()),
                got: format!("{}", y.len()),
            });
        }
        let (features, x_scaled) = MinMaxScaler::<B>::new().fit_transform(x)?;
        let (target, y_scaled) = MinMaxScaler::<B>::new().fit_transform(&y.to_column())?;

        self.features = Some(features);
        self.target = Some(target);
        Ok((x_scaled, y_scaled.ravel()))
    }

    pub fn transform_features(&self, x: &Tensor2D<B>) -> Result<Tensor2D<B>, PreprocessingError> {
        self.feature_scaler()?.transform(x)
    }

    pub fn inverse_transform_features(
        &self,
        x: &Tensor2D<B>,
    ) -> Result<Tensor2D<B>, PreprocessingError> {
        self.feature_scaler()?.inverse_transform(x)
    }

    pub fn transform_target(&self, y: &Tensor1D<B>) -> Result<Tensor1D<B>, PreprocessingError> {
        Ok(self.target_scaler()?.transform(&y.to_column())?.ravel())
    }

    pub fn inverse_transform_target(
        &self,
        y: &Tensor1D<B>,
    ) -> Result<Tensor1D<B>, PreprocessingError> {
        Ok(self.target_scaler()?.inverse_transform(&y.to_column())?.ravel())
    }

    pub fn feature_scaler(&self) -> Result<&FittedMinMaxScaler<B>, PreprocessingError> {
        self.features
            .as_ref()
            .ok_or_else(|| PreprocessingError::NotFitted("feature scaler".to_string()))
    }

    pub fn target_scaler(&self) -> Result<&FittedMinMaxScaler<B>, PreprocessingError> {
        self.target
            .as_ref()
            .ok_or_else(|| PreprocessingError::NotFitted("target scaler".to_string()))
    }

    pub fn extract_params(&self) -> Result<ScalerPairParams, PreprocessingError> {
        Ok(ScalerPairParams {
            features: self.feature_scaler()?.extract_params(),
            target: self.target_scaler()?.extract_params(),
        })
    }

    pub fn from_params(params: ScalerPairParams) -> Result<Self, PreprocessingError> {
        let target = FittedMinMaxScaler::from_params(params.target)?;
        if target.n_features_in() != 1 {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: 1,
                got_features: target.n_features_in(),
            });
        }
        Ok(Self {
            features: Some(FittedMinMaxScaler::from_params(params.features)?),
            target: Some(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    fn sample() -> (Tensor2D<CpuBackend>, Tensor1D<CpuBackend>) {
        let x = Tensor2D::from_rows(&[[0.5, 10.0], [1.0, 5.0], [2.0, 8.0], [0.1, 2.0]]);
        let y = Tensor1D::new(vec![20.0, 5.0, 4.0, 20.0]);
        (x, y)
    }

    #[test]
    fn test_unfitted_pair_rejects_transforms() {
        let (x, y) = sample();
        let pair = ScalerPair::<CpuBackend>::new();
        assert!(!pair.is_fitted());
        assert!(matches!(
            pair.transform_features(&x),
            Err(PreprocessingError::NotFitted(_))
        ));
        assert!(matches!(
            pair.inverse_transform_features(&x),
            Err(PreprocessingError::NotFitted(_))
        ));
        assert!(matches!(
            pair.transform_target(&y),
            Err(PreprocessingError::NotFitted(_))
        ));
        assert!(matches!(
            pair.inverse_transform_target(&y),
            Err(PreprocessingError::NotFitted(_))
        ));
        assert!(pair.extract_params().is_err());
    }

    #[test]
    fn test_fit_transform_ranges() {
        let (x, y) = sample();
        let mut pair = ScalerPair::<CpuBackend>::new();
        let (xs, ys) = pair.fit_transform(&x, &y).unwrap();
        assert!(pair.is_fitted());

        for v in xs.to_vec().into_iter().chain(ys.to_vec()) {
            assert!((0.0..=1.0).contains(&v), "{} outside [0, 1]", v);
        }
        assert_eq!(ys.to_vec(), vec![1.0, 0.0625, 0.0, 1.0]);
    }

    #[test]
    fn test_roundtrip_features_and_target() {
        let (x, y) = sample();
        let mut pair = ScalerPair::<CpuBackend>::new();
        let (xs, ys) = pair.fit_transform(&x, &y).unwrap();

        let x_back = pair.inverse_transform_features(&xs).unwrap();
        let y_back = pair.inverse_transform_target(&ys).unwrap();
        for (a, b) in x.to_vec().iter().zip(x_back.to_vec().iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        for (a, b) in y.to_vec().iter().zip(y_back.to_vec().iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mismatched_lengths_leave_pair_unfitted() {
        let (x, _) = sample();
        let mut pair = ScalerPair::<CpuBackend>::new();
        let short = Tensor1D::new(vec![1.0, 2.0]);
        assert!(matches!(
            pair.fit_transform(&x, &short),
            Err(PreprocessingError::InvalidShape { .. })
        ));
        assert!(!pair.is_fitted());
    }

    #[test]
    fn test_params_roundtrip() {
        let (x, y) = sample();
        let mut pair = ScalerPair::<CpuBackend>::new();
        pair.fit_transform(&x, &y).unwrap();

        let restored = ScalerPair::<CpuBackend>::from_params(pair.extract_params().unwrap()).unwrap();
        assert_eq!(
            pair.transform_features(&x).unwrap().to_vec(),
            restored.transform_features(&x).unwrap().to_vec()
        );
        assert_eq!(
            pair.transform_target(&y).unwrap().to_vec(),
            restored.transform_target(&y).unwrap().to_vec()
        );
    }
}
