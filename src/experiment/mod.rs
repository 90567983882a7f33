//! Experiment driver: one wait-time network per dataset, comparison plots,
//! and sample predictions from an explicitly chosen network.

mod fit_line;
pub mod plot;

pub use fit_line::FitLine;

use crate::backend::CpuBackend;
use crate::config::{DatasetKind, ExperimentConfig};
use crate::dataset::QueueData;
use crate::error::{ModelError, Result};
use crate::metrics::{Metrics, RegressionMetrics};
use crate::network::{TrainingReport, WaitTimeNetwork};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What one dataset produced.
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub kind: DatasetKind,
    /// Rows kept after filtering.
    pub rows: usize,
    pub dropped: usize,
    pub report: TrainingReport,
    /// Metrics over the whole filtered dataset.
    pub overall: RegressionMetrics,
    /// Pearson correlation over the plotted sample.
    pub correlation: Option<f64>,
    pub plots: Vec<PathBuf>,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePrediction {
    pub arrival_rate: f64,
    pub queue_length: f64,
    pub wait_time: f64,
}

#[derive(Debug, Clone)]
pub struct ExperimentSummary {
    pub outcomes: Vec<DatasetOutcome>,
    pub sample_model: DatasetKind,
    pub samples: Vec<SamplePrediction>,
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>6} {:>7} {:>6} {:>12} {:>12} {:>12} {:>12}",
            "dataset", "rows", "dropped", "iters", "train RMSE", "val RMSE", "val MAE", "corr"
        )?;
        for o in &self.outcomes {
            let corr = o
                .correlation
                .map(|c| format!("{:.4}", c))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(
                f,
                "{:<14} {:>6} {:>7} {:>6} {:>12.6} {:>12.6} {:>12.6} {:>12}",
                o.kind.name(),
                o.rows,
                o.dropped,
                o.report.n_iter,
                o.report.train.rmse,
                o.report.validation.rmse,
                o.report.validation.mae,
                corr
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Test predictions ({} model):", self.sample_model)?;
        for s in &self.samples {
            writeln!(
                f,
                "  lambda={}, Lq={} -> Predicted Wq = {:.4}",
                s.arrival_rate, s.queue_length, s.wait_time
            )?;
        }
        Ok(())
    }
}

/// Runs the full analysis described by an [`ExperimentConfig`].
///
/// Trained networks are kept per dataset, so the sample predictions always
/// come from the one named by `sample_model`.
pub struct Experiment {
    config: ExperimentConfig,
    networks: BTreeMap<DatasetKind, WaitTimeNetwork<CpuBackend>>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            networks: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn network(&self, kind: DatasetKind) -> Option<&WaitTimeNetwork<CpuBackend>> {
        self.networks.get(&kind)
    }

    /// Trains and plots both datasets, then predicts the sample cases.
    pub fn run(&mut self) -> Result<ExperimentSummary> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let mut outcomes = Vec::with_capacity(DatasetKind::ALL.len());
        for kind in DatasetKind::ALL {
            outcomes.push(self.run_dataset(kind)?);
        }
        let samples = self.sample_predictions()?;
        Ok(ExperimentSummary {
            outcomes,
            sample_model: self.config.sample_model,
            samples,
        })
    }

    pub fn run_dataset(&mut self, kind: DatasetKind) -> Result<DatasetOutcome> {
        let path = self.config.dataset_path(kind);
        info!("=== {} dataset ({}) ===", kind, path.display());
        let data = QueueData::load(path, kind)?;
        if data.is_empty() {
            return Err(ModelError::EmptyData(format!(
                "{} has no valid rows",
                path.display()
            )));
        }

        let (x, y) = data.to_tensors::<CpuBackend>();
        let mut network = WaitTimeNetwork::<CpuBackend>::new(self.config.network.clone());
        let report = network.train(&x, &y, self.config.network.validation_split)?;

        let real = data.wait_times();
        let predicted = network.predict(&x)?.to_vec();
        let overall = Metrics::calculate_all(&real, &predicted);
        info!("{} overall: {}", kind, overall);

        let out = &self.config.output_dir;
        let mut variables = vec![
            ("Lambda (λ)", "lambda", data.arrival_rates()),
            ("Lq", "lq", data.queue_lengths()),
        ];
        if let Some(rho) = data.utilizations() {
            variables.push(("Rho (ρ)", "rho", rho));
        }

        let mut plots = Vec::with_capacity(variables.len() + 1);
        for (label, stem, xs) in &variables {
            let file = out.join(format!("{}_wq_vs_{}.svg", kind.name(), stem));
            plot::comparison_plot(&file, label, xs, &real, &predicted)?;
            plots.push(file);
        }

        let correlation = self.actual_vs_predicted(kind, &real, &predicted, &mut plots)?;

        let model_path = if self.config.save_models {
            let file = out.join(format!("{}_{}", kind.name(), self.config.model_file));
            network.save(&file)?;
            Some(file)
        } else {
            None
        };

        self.networks.insert(kind, network);
        Ok(DatasetOutcome {
            kind,
            rows: data.len(),
            dropped: data.dropped(),
            report,
            overall,
            correlation,
            plots,
            model_path,
        })
    }

    /// Draws at most `plot_sample_size` points and logs their correlation.
    fn actual_vs_predicted(
        &self,
        kind: DatasetKind,
        real: &[f64],
        predicted: &[f64],
        plots: &mut Vec<PathBuf>,
    ) -> Result<Option<f64>> {
        let n = real.len();
        let k = self.config.plot_sample_size.min(n);
        let mut rng = StdRng::seed_from_u64(self.config.network.random_state);
        let mut picked = rand::seq::index::sample(&mut rng, n, k).into_vec();
        picked.sort_unstable();

        let actual: Vec<f64> = picked.iter().map(|&i| real[i]).collect();
        let pred: Vec<f64> = picked.iter().map(|&i| predicted[i]).collect();

        let file = self
            .config
            .output_dir
            .join(format!("{}_actual_vs_predicted.svg", kind.name()));
        plot::actual_vs_predicted_plot(&file, &actual, &pred)?;
        plots.push(file);

        let correlation = Metrics::pearson(&actual, &pred);
        match correlation {
            Some(c) => info!("{}: correlation between actual and predicted: {:.4}", kind, c),
            None => info!("{}: correlation undefined for constant values", kind),
        }
        Ok(correlation)
    }

    /// Predicts every configured `(λ, Lq)` case with the `sample_model`
    /// network.
    pub fn sample_predictions(&self) -> Result<Vec<SamplePrediction>> {
        let kind = self.config.sample_model;
        let network = self.networks.get(&kind).ok_or_else(|| {
            ModelError::NotFitted(format!("no trained network for the {} dataset", kind))
        })?;
        self.config
            .sample_cases
            .iter()
            .map(|&(arrival_rate, queue_length)| {
                Ok(SamplePrediction {
                    arrival_rate,
                    queue_length,
                    wait_time: network.predict_one(&[arrival_rate, queue_length])?,
                })
            })
            .collect()
    }
}
