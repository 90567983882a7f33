use crate::backend::{Backend, Scalar};
use crate::model::{MlpParams, MlpRegressor, ParamOps, TrainableModel, Unfitted};

/// Penalty added to the data loss, with its gradient w.r.t. the parameters.
///
/// `n_samples` is the size of the batch the data loss was averaged over, so
/// the penalty stays on the same per-sample scale.
pub trait Regularizer<B: Backend, M: TrainableModel<B>> {
    fn regularizer_penalty_grad(&self, model: &M, n_samples: usize) -> (Scalar<B>, M::Gradients);
}

/// Weight decay on the connection weights, biases excluded:
/// ```text
/// penalty = 0.5 · α · Σ w² / n
/// grad    = α · W / n
/// ```
#[derive(Debug, Clone, Copy)]
pub struct L2 {
    alpha: f64,
}

impl L2 {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl<B: Backend> Regularizer<B, MlpRegressor<B, Unfitted>> for L2 {
    fn regularizer_penalty_grad(
        &self,
        model: &MlpRegressor<B, Unfitted>,
        n_samples: usize,
    ) -> (Scalar<B>, MlpParams<B>) {
        let params = model.params();
        let n = n_samples.max(1) as f64;
        let penalty = 0.5 * self.alpha * params.weight_sum_squares() / n;

        let factor = Scalar::<B>::new(self.alpha / n);
        let mut grads = params.zeros_like();
        for (grad, layer) in grads.layers.iter_mut().zip(params.layers.iter()) {
            grad.weights = layer.weights.scale(&factor);
        }
        (Scalar::new(penalty), grads)
    }
}

pub struct NoRegularizer;

impl<B: Backend> Regularizer<B, MlpRegressor<B, Unfitted>> for NoRegularizer {
    fn regularizer_penalty_grad(
        &self,
        model: &MlpRegressor<B, Unfitted>,
        _n_samples: usize,
    ) -> (Scalar<B>, MlpParams<B>) {
        (Scalar::new(0.0), model.params().zeros_like())
    }
}
