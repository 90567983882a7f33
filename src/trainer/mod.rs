//! Mini-batch training loop with early stopping.

use crate::{
    backend::{Backend, Tensor1D, Tensor2D},
    dataset::{shuffled_split, Dataset, Subset},
    error::{ModelError, Result},
    loss::Loss,
    metrics::Metrics,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Batch size used when none is configured, capped at the training set size.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// What happened during one call to [`Trainer::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Epochs actually run.
    pub n_iter: usize,
    /// Mean training objective per epoch (half squared error plus penalty).
    pub loss_curve: Vec<f64>,
    /// Validation R² per epoch; empty when no validation partition was used.
    pub validation_scores: Vec<f64>,
    pub best_validation_score: Option<f64>,
    pub best_loss: f64,
    /// `true` if training ended on the patience rule rather than `max_epochs`.
    pub stopped_early: bool,
    pub n_train: usize,
    pub n_validation: usize,
}

/// Immutable training settings plus the loss, optimizer and regularizer.
///
/// Built with [`TrainerBuilder`]; one trainer can fit any number of models.
pub struct Trainer<B, L, O, M, P, R>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
    R: Regularizer<B, M>,
{
    pub(crate) batch_size: Option<usize>,
    pub(crate) max_epochs: usize,
    pub(crate) shuffle: bool,
    pub(crate) seed: u64,
    pub(crate) early_stopping: bool,
    pub(crate) validation_fraction: f64,
    pub(crate) n_iter_no_change: usize,
    pub(crate) tol: f64,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_backend: PhantomData<B>,
    _phantom_model: PhantomData<M>,
}

pub struct TrainerBuilder<B, L, O, M, P, R>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
    R: Regularizer<B, M>,
{
    batch_size: Option<usize>,
    max_epochs: usize,
    shuffle: bool,
    seed: u64,
    early_stopping: bool,
    validation_fraction: f64,
    n_iter_no_change: usize,
    tol: f64,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_backend: PhantomData<B>,
    _phantom_model: PhantomData<M>,
}

impl<B, L, O, M, P, R> TrainerBuilder<B, L, O, M, P, R>
where
    B: Backend,
    L: Loss<B>,
    M: TrainableModel<B, Params = P, Gradients = P>,
    O: Optimizer<B, P>,
    R: Regularizer<B, M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: None,
            max_epochs: 1000,
            shuffle: true,
            seed: 42,
            early_stopping: false,
            validation_fraction: 0.1,
            n_iter_no_change: 10,
            tol: 1e-4,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_backend: PhantomData,
            _phantom_model: PhantomData,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// `min(200, n_samples)`
    pub fn auto_batch_size(mut self) -> Self {
        self.batch_size = None;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Seeds both the per-epoch shuffling and the validation hold-out.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Holds out `validation_fraction` of the data and stops once the
    /// validation R² has not improved for the patience window.
    pub fn early_stopping(mut self, validation_fraction: f64) -> Self {
        self.early_stopping = true;
        self.validation_fraction = validation_fraction;
        self
    }

    pub fn n_iter_no_change(mut self, patience: usize) -> Self {
        self.n_iter_no_change = patience;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn build(self) -> Trainer<B, L, O, M, P, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            shuffle: self.shuffle,
            seed: self.seed,
            early_stopping: self.early_stopping,
            validation_fraction: self.validation_fraction,
            n_iter_no_change: self.n_iter_no_change,
            tol: self.tol,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_backend: PhantomData,
            _phantom_model: PhantomData,
        }
    }
}

fn data_error<E: std::fmt::Debug>(err: E) -> ModelError {
    ModelError::Dataset(format!("{:?}", err))
}

/// Patience bookkeeping shared by both monitoring modes.
struct Patience {
    limit: usize,
    tol: f64,
    best: f64,
    stale: usize,
}

impl Patience {
    fn new(limit: usize, tol: f64) -> Self {
        Self {
            limit,
            tol,
            best: f64::NEG_INFINITY,
            stale: 0,
        }
    }

    /// Records a score where higher is better; returns `true` when the patience
    /// window is exhausted.
    fn observe(&mut self, score: f64) -> bool {
        if score > self.best + self.tol {
            self.stale = 0;
        } else {
            self.stale += 1;
        }
        if score > self.best {
            self.best = score;
        }
        self.stale >= self.limit
    }
}

impl<B, L, O, M, P, R> Trainer<B, L, O, M, P, R>
where
    B: Backend,
    L: Loss<B, Target = Tensor1D<B>, Prediction = Tensor1D<B>>,
    M: TrainableModel<B, Input = Tensor2D<B>, Prediction = Tensor1D<B>, Params = P, Gradients = P>,
    O: Optimizer<B, P> + Clone,
    R: Regularizer<B, M>,
    P: ParamOps<B>,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<B, L, O, M, P, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    /// Trains `model` on `dataset` and returns the fitted model.
    ///
    /// With early stopping enabled the best-scoring parameters on the held-out
    /// partition are restored before fitting ends. Otherwise, including when
    /// the dataset is too small to hold out a sample, training stops once the
    /// training loss has not improved by more than `tol` for
    /// `n_iter_no_change` epochs. Pass `usize::MAX` as the patience to always
    /// run `max_epochs`.
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<(M::Output, FitReport)>
    where
        D: Dataset,
    {
        let n_total = dataset
            .len()
            .ok_or_else(|| ModelError::Dataset("Dataset length unknown".to_string()))?;
        if n_total == 0 {
            return Err(ModelError::EmptyData("Dataset is empty".to_string()));
        }

        let mut train_idx: Vec<usize> = (0..n_total).collect();
        let mut validation = None;
        if self.early_stopping {
            let split = shuffled_split(n_total, self.validation_fraction, self.seed);
            if split.train.is_empty() || split.validation.is_empty() {
                warn!(
                    "{} samples cannot spare a validation partition; monitoring training loss",
                    n_total
                );
            } else {
                validation = Some(dataset.gather::<B>(&split.validation).map_err(data_error)?);
                train_idx = split.train;
            }
        }

        let n_train = train_idx.len();
        let n_validation = n_total - n_train;
        let train = Subset::new(dataset, train_idx);
        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).clamp(1, n_train);
        debug!(
            "Fitting on {} samples ({} held out), batch size {}",
            n_train, n_validation, batch_size
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut optimizer = self.optimizer.clone();
        optimizer.reset();

        let mut patience = Patience::new(self.n_iter_no_change.max(1), self.tol);
        let mut best_params = model.params().clone();
        let mut best_loss = f64::INFINITY;
        let mut loss_curve = Vec::new();
        let mut validation_scores = Vec::new();
        let mut stopped_early = false;

        for epoch in 0..self.max_epochs {
            let batches = if self.shuffle {
                train.shuffled_batches::<B, _>(batch_size, &mut rng)
            } else {
                train.batches::<B>(batch_size)
            };

            let mut accumulated = 0.0;
            for batch in batches {
                let (batch_x, batch_y) = batch.map_err(data_error)?;
                let n_batch = batch_y.len();

                let (preds, activations) = model.forward_train(&batch_x);
                let (penalty, reg_grads) = self.regularizer.regularizer_penalty_grad(&model, n_batch);
                let batch_loss = 0.5 * self.loss_fn.loss(&preds, &batch_y).to_f64() + penalty.to_f64();
                accumulated += batch_loss * n_batch as f64;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&activations, &grad_preds).add(&reg_grads);
                let new_params = optimizer.step(model.params(), &grads);
                model.update_params(&new_params);
            }

            let epoch_loss = accumulated / n_train as f64;
            loss_curve.push(epoch_loss);
            best_loss = best_loss.min(epoch_loss);

            let exhausted = match &validation {
                Some((val_x, val_y)) => {
                    let score = Metrics::r_squared(&val_y.to_vec(), &model.forward(val_x).to_vec());
                    validation_scores.push(score);
                    debug!(
                        "Epoch {}: loss = {:.6}, validation R² = {:.6}",
                        epoch + 1,
                        epoch_loss,
                        score
                    );
                    if score > patience.best {
                        best_params = model.params().clone();
                    }
                    patience.observe(score)
                }
                None => {
                    debug!("Epoch {}: loss = {:.6}", epoch + 1, epoch_loss);
                    patience.observe(-epoch_loss)
                }
            };

            if exhausted {
                stopped_early = true;
                info!(
                    "No improvement greater than {} for {} epochs; stopping at epoch {}",
                    self.tol,
                    patience.limit,
                    epoch + 1
                );
                break;
            }
        }

        let n_iter = loss_curve.len();
        if !stopped_early {
            info!("Reached the epoch limit ({}) without converging", self.max_epochs);
        }

        let best_validation_score = if validation.is_some() && !validation_scores.is_empty() {
            model.update_params(&best_params);
            Some(patience.best)
        } else {
            None
        };

        let report = FitReport {
            n_iter,
            loss_curve,
            validation_scores,
            best_validation_score,
            best_loss,
            stopped_early,
            n_train,
            n_validation,
        };
        Ok((model.into_fitted(), report))
    }
}
