use crate::backend::{Backend, Scalar};
use crate::model::ParamOps;
use std::marker::PhantomData;

/// Trait for gradient-based optimizers.
///
/// Optimizers turn gradients into parameter updates. Training logic lives in
/// the `Trainer`; any model whose parameters implement [`ParamOps`] can be
/// paired with any optimizer here without dynamic dispatch.
///
/// # Type Parameters
/// * `B`: computation backend implementing [`Backend`]
/// * `P`: model parameters type (e.g. [`MlpParams`](crate::model::MlpParams))
///
/// # Example
/// ```rust
/// use queuenet::backend::{CpuBackend, Scalar};
/// use queuenet::config::Activation;
/// use queuenet::model::{MlpRegressor, ParamOps, TrainableModel, Unfitted};
/// use queuenet::optimizer::{Optimizer, SGD};
///
/// let net = MlpRegressor::<CpuBackend, Unfitted>::new(2, &[4], Activation::Relu, 0);
/// let params = net.params().clone();
/// let grads = params.zeros_like().add_scalar(Scalar::new(1.0));
///
/// let mut sgd = SGD::<CpuBackend>::new(0.1);
/// let updated = sgd.step(&params, &grads);
/// let before = params.layers[0].bias.to_vec();
/// let after = updated.layers[0].bias.to_vec();
/// assert!((before[0] - after[0] - 0.1).abs() < 1e-12);
/// ```
pub trait Optimizer<B: Backend, P> {
    /// Returns the updated parameters. Stateful optimizers advance their
    /// internal moments on every call.
    fn step(&mut self, params: &P, gradients: &P) -> P;

    /// Clears accumulated state so the optimizer can start a fresh fit.
    fn reset(&mut self) {}
}

/// Stochastic Gradient Descent:
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
#[derive(Clone, Debug)]
pub struct SGD<B: Backend> {
    lr: Scalar<B>,
}

impl<B: Backend> SGD<B> {
    pub fn new(lr: f64) -> Self {
        Self {
            lr: Scalar::<B>::new(lr),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr.to_f64()
    }
}

impl<B: Backend, P: ParamOps<B>> Optimizer<B, P> for SGD<B> {
    fn step(&mut self, params: &P, grads: &P) -> P {
        // Using (-lr) enables a single scale + add
        let neg_lr = Scalar::<B>::new(0.0) - self.lr;
        params.add(&grads.scale(neg_lr))
    }
}

/// Adam with bias correction folded into the step size:
/// ```text
/// m ← β₁ m + (1 - β₁) g
/// v ← β₂ v + (1 - β₂) g²
/// η_t = η · sqrt(1 - β₂ᵗ) / (1 - β₁ᵗ)
/// θ ← θ - η_t · m / (sqrt(v) + ε)
/// ```
///
/// Moments are allocated lazily on the first step, so the same optimizer
/// value can be cloned into several fits before any parameters exist.
#[derive(Clone, Debug)]
pub struct Adam<B: Backend, P> {
    lr: f64,
    beta_1: f64,
    beta_2: f64,
    epsilon: f64,
    t: u64,
    m: Option<P>,
    v: Option<P>,
    _backend: PhantomData<B>,
}

impl<B: Backend, P> Adam<B, P> {
    /// Adam with the usual defaults `β₁ = 0.9`, `β₂ = 0.999`, `ε = 1e-8`.
    pub fn new(lr: f64) -> Self {
        Self::with_betas(lr, 0.9, 0.999, 1e-8)
    }

    pub fn with_betas(lr: f64, beta_1: f64, beta_2: f64, epsilon: f64) -> Self {
        Self {
            lr,
            beta_1,
            beta_2,
            epsilon,
            t: 0,
            m: None,
            v: None,
            _backend: PhantomData,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    /// Number of steps taken since creation or the last reset.
    pub fn steps(&self) -> u64 {
        self.t
    }
}

impl<B: Backend, P: ParamOps<B>> Optimizer<B, P> for Adam<B, P> {
    fn step(&mut self, params: &P, grads: &P) -> P {
        self.t += 1;
        let g2 = grads.mul(grads);

        let m = match self.m.take() {
            Some(m) => m
                .scale(Scalar::new(self.beta_1))
                .add(&grads.scale(Scalar::new(1.0 - self.beta_1))),
            None => grads.scale(Scalar::new(1.0 - self.beta_1)),
        };
        let v = match self.v.take() {
            Some(v) => v
                .scale(Scalar::new(self.beta_2))
                .add(&g2.scale(Scalar::new(1.0 - self.beta_2))),
            None => g2.scale(Scalar::new(1.0 - self.beta_2)),
        };

        let t = self.t as i32;
        let lr_t = self.lr * (1.0 - self.beta_2.powi(t)).sqrt() / (1.0 - self.beta_1.powi(t));
        let update = m
            .div(&v.sqrt().add_scalar(Scalar::new(self.epsilon)))
            .scale(Scalar::new(-lr_t));

        self.m = Some(m);
        self.v = Some(v);
        params.add(&update)
    }

    fn reset(&mut self) {
        self.t = 0;
        self.m = None;
        self.v = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBackend, Tensor1D, Tensor2D};
    use crate::model::{DenseParams, MlpParams};

    fn params(w: f64, b: f64) -> MlpParams<CpuBackend> {
        MlpParams {
            layers: vec![DenseParams {
                weights: Tensor2D::new(vec![w], 1, 1),
                bias: Tensor1D::new(vec![b]),
            }],
        }
    }

    fn values(p: &MlpParams<CpuBackend>) -> (f64, f64) {
        (p.layers[0].weights.to_vec()[0], p.layers[0].bias.to_vec()[0])
    }

    #[test]
    fn test_sgd_step() {
        let mut sgd = SGD::<CpuBackend>::new(0.5);
        let updated = sgd.step(&params(1.0, 2.0), &params(0.2, -0.4));
        let (w, b) = values(&updated);
        assert!((w - 0.9).abs() < 1e-12);
        assert!((b - 2.2).abs() < 1e-12);
        assert_eq!(sgd.learning_rate(), 0.5);
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() {
        // With bias correction, the first step is ±lr·g/(|g|+ε) ≈ ±lr.
        let mut adam = Adam::<CpuBackend, MlpParams<CpuBackend>>::new(0.01);
        let updated = adam.step(&params(1.0, 0.0), &params(3.0, -0.5));
        let (w, b) = values(&updated);
        assert!((w - (1.0 - 0.01)).abs() < 1e-6);
        assert!((b - 0.01).abs() < 1e-6);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_adam_minimizes_quadratic() {
        // f(w) = (w - 3)², grad = 2 (w - 3)
        let mut adam = Adam::<CpuBackend, MlpParams<CpuBackend>>::new(0.1);
        let mut p = params(0.0, 0.0);
        for _ in 0..500 {
            let (w, b) = values(&p);
            p = adam.step(&p, &params(2.0 * (w - 3.0), 2.0 * b));
        }
        let (w, _) = values(&p);
        assert!((w - 3.0).abs() < 5e-2, "w = {}", w);
    }

    #[test]
    fn test_adam_reset_clears_state() {
        let mut adam = Adam::<CpuBackend, MlpParams<CpuBackend>>::new(0.01);
        let p = params(1.0, 1.0);
        let g = params(1.0, 1.0);
        let first = adam.step(&p, &g);
        adam.step(&p, &g);
        adam.reset();
        assert_eq!(adam.steps(), 0);
        let again = adam.step(&p, &g);
        assert_eq!(values(&first), values(&again));
    }
}
