//! # queuenet
//!
//! Predicts queue wait time (`Wq`) from arrival rate (`λ`) and mean queue
//! length (`Lq`) with a small feed-forward network.
//!
//! The crate is layered bottom-up:
//!
//! - [`backend`]: tensor operations behind the [`Backend`] trait
//! - [`preprocessing`]: min-max scalers and the feature/target [`ScalerPair`]
//! - [`model`], [`loss`], [`optimizer`], [`regularizers`], [`trainer`]: the MLP
//!   regressor and its training loop
//! - [`network`]: [`WaitTimeNetwork`], which ties scaling, training,
//!   evaluation and persistence together
//! - [`experiment`]: loads the CSV datasets, trains one network per dataset
//!   and renders SVG plots
//!
//! ```
//! use queuenet::{CpuBackend, NetworkConfig, Tensor1D, Tensor2D, WaitTimeNetwork};
//!
//! let rows: Vec<[f64; 2]> = (1..=30).map(|i| [0.03 * i as f64, 0.1 * i as f64]).collect();
//! let x = Tensor2D::<CpuBackend>::from_rows(&rows);
//! let y = Tensor1D::<CpuBackend>::new(rows.iter().map(|r| r[1] / r[0]).collect());
//!
//! let mut net = WaitTimeNetwork::<CpuBackend>::new(
//!     NetworkConfig::default().with_hidden_layers(vec![8]).with_max_iter(10),
//! );
//! let report = net.train(&x, &y, 0.2).unwrap();
//! assert!(report.validation.rmse >= 0.0);
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod preprocessing;
pub mod regularizers;
pub mod serialization;
pub mod trainer;

pub use backend::{Backend, CpuBackend, Scalar, ScalarOps, Tensor1D, Tensor2D};
pub use config::{Activation, DatasetKind, ExperimentConfig, NetworkConfig, Solver};
pub use error::{ModelError, Result};
pub use experiment::{Experiment, ExperimentSummary};
pub use metrics::{Metrics, RegressionMetrics};
pub use network::{TrainingReport, WaitTimeNetwork};
pub use preprocessing::ScalerPair;
