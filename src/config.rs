//! Hyperparameters and experiment settings.
//!
//! Both config types deserialize with `#[serde(default)]`, so a JSON file only
//! needs the fields it overrides:
//!
//! ```
//! use queuenet::config::{DatasetKind, ExperimentConfig};
//!
//! let cfg: ExperimentConfig =
//!     serde_json::from_str(r#"{"sample_model": "single_server", "network": {"max_iter": 50}}"#)
//!         .unwrap();
//! assert_eq!(cfg.sample_model, DatasetKind::SingleServer);
//! assert_eq!(cfg.network.max_iter, 50);
//! assert_eq!(cfg.network.hidden_layers, vec![256, 128, 64]);
//! ```

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hidden-layer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

/// Weight update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    #[default]
    Adam,
    Sgd,
}

/// Regressor hyperparameters plus the wrapper's validation split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Width of each hidden layer, input side first.
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
    pub solver: Solver,
    pub learning_rate: f64,
    /// L2 penalty strength.
    pub alpha: f64,
    /// `None` means `min(200, n_samples)`.
    pub batch_size: Option<usize>,
    /// Upper bound on training epochs.
    pub max_iter: usize,
    pub shuffle: bool,
    pub early_stopping: bool,
    /// Share of the training partition held out for early stopping.
    pub validation_fraction: f64,
    /// Patience, in epochs without improvement.
    pub n_iter_no_change: usize,
    /// Minimum improvement that resets the patience counter.
    pub tol: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    /// Seed for weight init, shuffling and splits.
    pub random_state: u64,
    /// Share of the data `WaitTimeNetwork::train` keeps for validation.
    pub validation_split: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![256, 128, 64],
            activation: Activation::Relu,
            solver: Solver::Adam,
            learning_rate: 0.001,
            alpha: 0.001,
            batch_size: None,
            max_iter: 1000,
            shuffle: true,
            early_stopping: true,
            validation_fraction: 0.2,
            n_iter_no_change: 50,
            tol: 1e-4,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
            random_state: 42,
            validation_split: 0.2,
        }
    }
}

fn open_unit(name: &str, v: f64) -> Result<()> {
    if v > 0.0 && v < 1.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidConfig(format!(
            "{} must lie in (0, 1), got {}",
            name, v
        )))
    }
}

impl NetworkConfig {
    pub fn with_hidden_layers(mut self, layers: Vec<usize>) -> Self {
        self.hidden_layers = layers;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_early_stopping(mut self, enabled: bool) -> Self {
        self.early_stopping = enabled;
        self
    }

    pub fn with_n_iter_no_change(mut self, n: usize) -> Self {
        self.n_iter_no_change = n;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_validation_split(mut self, split: f64) -> Self {
        self.validation_split = split;
        self
    }

    /// Rejects values no network could train with.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers.is_empty() {
            return Err(ModelError::InvalidConfig(
                "hidden_layers must name at least one layer".to_string(),
            ));
        }
        if let Some(i) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(ModelError::InvalidConfig(format!(
                "hidden layer {} has zero units",
                i
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        if self.batch_size == Some(0) {
            return Err(ModelError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidConfig(
                "max_iter must be positive".to_string(),
            ));
        }
        if self.n_iter_no_change == 0 {
            return Err(ModelError::InvalidConfig(
                "n_iter_no_change must be positive".to_string(),
            ));
        }
        open_unit("validation_fraction", self.validation_fraction)?;
        open_unit("validation_split", self.validation_split)?;
        if !(0.0..1.0).contains(&self.beta_1) || !(0.0..1.0).contains(&self.beta_2) {
            return Err(ModelError::InvalidConfig(
                "beta_1 and beta_2 must lie in [0, 1)".to_string(),
            ));
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(ModelError::InvalidConfig(
                "epsilon must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which of the two datasets a setting refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// One server: `λ`, `Lq`, `Wq`.
    SingleServer,
    /// Several servers: adds `s` and `ρ`.
    MultiServer,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::SingleServer, DatasetKind::MultiServer];

    /// Short name used in file names and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::SingleServer => "single_server",
            DatasetKind::MultiServer => "multi_server",
        }
    }

    pub fn has_utilization(&self) -> bool {
        matches!(self, DatasetKind::MultiServer)
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for one run of the experiment driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub single_server_path: PathBuf,
    pub multi_server_path: PathBuf,
    /// Plots and saved models land here.
    pub output_dir: PathBuf,
    pub model_file: String,
    pub save_models: bool,
    /// Cap on points drawn in the actual-vs-predicted scatter.
    pub plot_sample_size: usize,
    /// `(λ, Lq)` pairs printed after training.
    pub sample_cases: Vec<(f64, f64)>,
    /// Wrapper used for the sample predictions.
    pub sample_model: DatasetKind,
    pub network: NetworkConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            single_server_path: PathBuf::from("data/mm1.csv"),
            multi_server_path: PathBuf::from("data/mmc.csv"),
            output_dir: PathBuf::from("output"),
            model_file: crate::network::DEFAULT_MODEL_FILE.to_string(),
            save_models: true,
            plot_sample_size: 1000,
            sample_cases: vec![(0.5, 10.0), (1.0, 5.0), (2.0, 8.0), (0.1, 2.0), (0.8, 16.0)],
            sample_model: DatasetKind::MultiServer,
            network: NetworkConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Reads a (possibly partial) JSON config.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    pub fn with_dataset_paths<P: Into<PathBuf>, Q: Into<PathBuf>>(
        mut self,
        single_server: P,
        multi_server: Q,
    ) -> Self {
        self.single_server_path = single_server.into();
        self.multi_server_path = multi_server.into();
        self
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_save_models(mut self, save: bool) -> Self {
        self.save_models = save;
        self
    }

    pub fn with_sample_model(mut self, kind: DatasetKind) -> Self {
        self.sample_model = kind;
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn dataset_path(&self, kind: DatasetKind) -> &Path {
        match kind {
            DatasetKind::SingleServer => &self.single_server_path,
            DatasetKind::MultiServer => &self.multi_server_path,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        if self.plot_sample_size == 0 {
            return Err(ModelError::InvalidConfig(
                "plot_sample_size must be positive".to_string(),
            ));
        }
        if self.model_file.trim().is_empty() {
            return Err(ModelError::InvalidConfig(
                "model_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_defaults() {
        let cfg = NetworkConfig::default();
        assert_eq!(cfg.hidden_layers, vec![256, 128, 64]);
        assert_eq!(cfg.activation, Activation::Relu);
        assert_eq!(cfg.solver, Solver::Adam);
        assert_eq!(cfg.max_iter, 1000);
        assert_eq!(cfg.n_iter_no_change, 50);
        assert_eq!(cfg.random_state, 42);
        assert!(cfg.early_stopping);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = NetworkConfig::default();
        assert!(base.clone().with_hidden_layers(vec![]).validate().is_err());
        assert!(base.clone().with_hidden_layers(vec![8, 0]).validate().is_err());
        assert!(base.clone().with_learning_rate(0.0).validate().is_err());
        assert!(base.clone().with_max_iter(0).validate().is_err());
        assert!(base.clone().with_validation_split(1.0).validate().is_err());
        assert!(base.clone().with_validation_split(0.0).validate().is_err());
        assert!(base.clone().with_batch_size(0).validate().is_err());
        assert!(matches!(
            base.with_alpha(-1.0).validate(),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_experiment_defaults() {
        let cfg = ExperimentConfig::default();
        assert_eq!(cfg.sample_model, DatasetKind::MultiServer);
        assert_eq!(cfg.sample_cases.len(), 5);
        assert_eq!(cfg.sample_cases[0], (0.5, 10.0));
        assert_eq!(cfg.plot_sample_size, 1000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_activation_serde_names() {
        let a: Activation = serde_json::from_str("\"logistic\"").unwrap();
        assert_eq!(a, Activation::Logistic);
        assert_eq!(serde_json::to_string(&Solver::Sgd).unwrap(), "\"sgd\"");
    }

    #[test]
    fn test_from_json_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(
            &path,
            r#"{"output_dir": "plots", "network": {"hidden_layers": [16, 8]}}"#,
        )
        .unwrap();

        let cfg = ExperimentConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("plots"));
        assert_eq!(cfg.network.hidden_layers, vec![16, 8]);
        assert_eq!(cfg.network.learning_rate, 0.001);
        assert_eq!(cfg.model_file, "queue_wait_model.bin");
    }

    #[test]
    fn test_from_json_file_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ExperimentConfig::from_json_file(&path),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn test_dataset_kind_names() {
        assert_eq!(DatasetKind::SingleServer.to_string(), "single_server");
        assert!(DatasetKind::MultiServer.has_utilization());
        assert!(!DatasetKind::SingleServer.has_utilization());
    }
}
