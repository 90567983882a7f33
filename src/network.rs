//! Wait-time network: scaling, training, evaluation and persistence around
//! the MLP regressor.

use crate::backend::{Backend, CpuBackend, Tensor1D, Tensor2D};
use crate::config::{NetworkConfig, Solver};
use crate::dataset::{shuffled_split, InMemoryDataset};
use crate::error::{ModelError, Result};
use crate::loss::MSELoss;
use crate::metrics::{Metrics, RegressionMetrics};
use crate::model::{Fitted, InferenceModel, MlpParams, MlpRegressor, SerializableMlpParams, Unfitted};
use crate::optimizer::{Adam, Optimizer, SGD};
use crate::preprocessing::{FittedTransformer, ScalerPair, ScalerPairParams};
use crate::regularizers::L2;
use crate::serialization::SerializableParams;
use crate::trainer::{FitReport, Trainer};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MODEL_FILE: &str = "queue_wait_model.bin";

const ARTIFACT_TAG: &str = "queuenet/wait-time-model";
const ARTIFACT_VERSION: u32 = 1;

/// Everything needed to rebuild a trained [`WaitTimeNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format: String,
    pub version: u32,
    pub config: NetworkConfig,
    pub network: SerializableMlpParams,
    pub scalers: ScalerPairParams,
}

/// Outcome of [`WaitTimeNetwork::train`]. Metrics are in original target units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train: RegressionMetrics,
    pub validation: RegressionMetrics,
    pub n_iter: usize,
    pub n_train: usize,
    pub n_validation: usize,
    pub fit: FitReport,
}

/// Predicts wait time from `(arrival_rate, queue_length)`.
///
/// Constructed untrained; [`train`](Self::train) fits the scalers and the
/// regressor together, and nothing is stored unless it succeeds.
///
/// # Example
/// ```
/// use queuenet::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use queuenet::config::NetworkConfig;
/// use queuenet::network::WaitTimeNetwork;
///
/// let rows: Vec<[f64; 2]> = (1..=20).map(|i| [0.05 * i as f64, i as f64]).collect();
/// let x = Tensor2D::<CpuBackend>::from_rows(&rows);
/// let y = Tensor1D::<CpuBackend>::new(rows.iter().map(|r| r[1] / r[0]).collect());
///
/// let config = NetworkConfig::default()
///     .with_hidden_layers(vec![8])
///     .with_max_iter(20);
/// let mut net = WaitTimeNetwork::<CpuBackend>::new(config);
/// assert!(net.predict(&x).is_err());
///
/// let report = net.train(&x, &y, 0.2).unwrap();
/// assert_eq!(report.n_validation, 4);
/// assert_eq!(net.predict(&x).unwrap().len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct WaitTimeNetwork<B: Backend = CpuBackend> {
    config: NetworkConfig,
    scalers: ScalerPair<B>,
    model: Option<MlpRegressor<B, Fitted>>,
}

impl<B: Backend> Default for WaitTimeNetwork<B> {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

fn value_range<B: Backend>(t: &Tensor1D<B>) -> (f64, f64) {
    t.to_vec()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

impl<B: Backend> WaitTimeNetwork<B> {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            scalers: ScalerPair::new(),
            model: None,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn scalers(&self) -> &ScalerPair<B> {
        &self.scalers
    }

    fn fitted(&self) -> Result<&MlpRegressor<B, Fitted>> {
        self.model
            .as_ref()
            .ok_or_else(|| ModelError::NotFitted("call train() or load() first".to_string()))
    }

    /// Fits the scalers on all of `x`/`y`, holds out
    /// `ceil(n * validation_split)` shuffled rows, trains on the rest and
    /// reports metrics on both partitions.
    pub fn train(
        &mut self,
        x: &Tensor2D<B>,
        y: &Tensor1D<B>,
        validation_split: f64,
    ) -> Result<TrainingReport> {
        self.config.validate()?;
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(ModelError::LengthMismatch {
                expected: n_samples,
                got: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(ModelError::EmptyData(
                "train() needs at least one sample".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&validation_split) {
            return Err(ModelError::InvalidConfig(format!(
                "validation_split must lie in [0, 1), got {}",
                validation_split
            )));
        }

        info!("Training on {} samples with {} features", n_samples, n_features);
        for j in 0..n_features {
            let (lo, hi) = value_range(&x.column(j));
            info!("  feature {} range: [{:.4}, {:.4}]", j, lo, hi);
        }
        let (lo, hi) = value_range(y);
        info!("  target range: [{:.4}, {:.4}]", lo, hi);

        let mut scalers = ScalerPair::new();
        let (x_scaled, y_scaled) = scalers.fit_transform(x, y)?;

        let split = shuffled_split(n_samples, validation_split, self.config.random_state);
        if split.train.is_empty() || split.validation.is_empty() {
            return Err(ModelError::InsufficientData(format!(
                "{} samples with validation split {} leave {} for training and {} for validation",
                n_samples,
                validation_split,
                split.train.len(),
                split.validation.len()
            )));
        }
        let x_train = x_scaled.select_rows(&split.train);
        let y_train = y_scaled.select(&split.train);
        let x_val = x_scaled.select_rows(&split.validation);
        let y_val = y_scaled.select(&split.validation);
        info!(
            "Split into {} training and {} validation samples",
            split.train.len(),
            split.validation.len()
        );

        let dataset = InMemoryDataset::from_tensors(&x_train, &y_train)?;
        let model = MlpRegressor::<B, Unfitted>::new(
            n_features,
            &self.config.hidden_layers,
            self.config.activation,
            self.config.random_state,
        );
        let (fitted, fit) = match self.config.solver {
            Solver::Adam => self.fit_with(
                Adam::<B, MlpParams<B>>::with_betas(
                    self.config.learning_rate,
                    self.config.beta_1,
                    self.config.beta_2,
                    self.config.epsilon,
                ),
                model,
                &dataset,
            )?,
            Solver::Sgd => self.fit_with(SGD::<B>::new(self.config.learning_rate), model, &dataset)?,
        };

        let original_units = |x_part: &Tensor2D<B>, y_part: &Tensor1D<B>| -> Result<RegressionMetrics> {
            let pred = scalers.inverse_transform_target(&fitted.predict_batch(x_part))?;
            let truth = scalers.inverse_transform_target(y_part)?;
            Ok(Metrics::calculate_all(&truth.to_vec(), &pred.to_vec()))
        };
        let train = original_units(&x_train, &y_train)?;
        let validation = original_units(&x_val, &y_val)?;

        info!("Finished after {} iterations", fit.n_iter);
        info!("Training   MSE: {:.6}  MAE: {:.6}  RMSE: {:.6}", train.mse, train.mae, train.rmse);
        info!(
            "Validation MSE: {:.6}  MAE: {:.6}  RMSE: {:.6}",
            validation.mse, validation.mae, validation.rmse
        );

        self.scalers = scalers;
        self.model = Some(fitted);
        Ok(TrainingReport {
            train,
            validation,
            n_iter: fit.n_iter,
            n_train: split.train.len(),
            n_validation: split.validation.len(),
            fit,
        })
    }

    fn fit_with<O>(
        &self,
        optimizer: O,
        model: MlpRegressor<B, Unfitted>,
        dataset: &InMemoryDataset,
    ) -> Result<(MlpRegressor<B, Fitted>, FitReport)>
    where
        O: Optimizer<B, MlpParams<B>> + Clone,
    {
        let cfg = &self.config;
        let mut builder =
            Trainer::<B, MSELoss, O, MlpRegressor<B, Unfitted>, MlpParams<B>, L2>::builder(
                MSELoss,
                optimizer,
                L2::new(cfg.alpha),
            )
            .max_epochs(cfg.max_iter)
            .shuffle(cfg.shuffle)
            .seed(cfg.random_state)
            .n_iter_no_change(cfg.n_iter_no_change)
            .tol(cfg.tol);
        if let Some(size) = cfg.batch_size {
            builder = builder.batch_size(size);
        }
        if cfg.early_stopping {
            builder = builder.early_stopping(cfg.validation_fraction);
        }
        builder.build().fit(model, dataset)
    }

    /// Predictions in original units for each row of `x`.
    pub fn predict(&self, x: &Tensor2D<B>) -> Result<Tensor1D<B>> {
        let model = self.fitted()?;
        let x_scaled = self.scalers.transform_features(x)?;
        Ok(self.scalers.inverse_transform_target(&model.predict_batch(&x_scaled))?)
    }

    /// Prediction for a single feature row.
    pub fn predict_one(&self, features: &[f64]) -> Result<f64> {
        let x = Tensor2D::new(features.to_vec(), 1, features.len());
        Ok(self.predict(&x)?.sum().to_f64())
    }

    pub fn evaluate(&self, x: &Tensor2D<B>, y_true: &Tensor1D<B>) -> Result<RegressionMetrics> {
        self.fitted()?;
        if x.rows() != y_true.len() {
            return Err(ModelError::LengthMismatch {
                expected: x.rows(),
                got: y_true.len(),
            });
        }
        let pred = self.predict(x)?;
        Ok(Metrics::calculate_all(&y_true.to_vec(), &pred.to_vec()))
    }

    /// Writes the network, both scalers and the config as one artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let model = self.fitted()?;
        let artifact = ModelArtifact {
            format: ARTIFACT_TAG.to_string(),
            version: ARTIFACT_VERSION,
            config: self.config.clone(),
            network: model.extract_params(),
            scalers: self.scalers.extract_params()?,
        };
        std::fs::write(path.as_ref(), artifact.to_bytes()?)?;
        info!("Saved model to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let artifact = ModelArtifact::from_bytes(&bytes)?;
        if artifact.format != ARTIFACT_TAG || artifact.version != ARTIFACT_VERSION {
            return Err(ModelError::Serialization(format!(
                "unsupported artifact {} v{} (expected {} v{})",
                artifact.format, artifact.version, ARTIFACT_TAG, ARTIFACT_VERSION
            )));
        }

        let model = MlpRegressor::<B, Fitted>::from_params(&artifact.network)?;
        let scalers = ScalerPair::from_params(artifact.scalers)?;
        let expected = scalers.feature_scaler()?.n_features_in();
        if model.n_features() != expected {
            return Err(ModelError::Serialization(format!(
                "network expects {} features but the feature scaler has {}",
                model.n_features(),
                expected
            )));
        }
        info!("Loaded model from {}", path.as_ref().display());
        Ok(Self {
            config: artifact.config,
            scalers,
            model: Some(model),
        })
    }
}
