use crate::backend::{Backend, Scalar, Tensor1D};

/// A differentiable loss used during training.
///
/// `loss` gives the scalar value for logging and early stopping;
/// `grad_wrt_prediction` gives `∂L/∂pred`, which is fed to the model's
/// `backward()`.
pub trait Loss<B: Backend> {
    type Prediction;
    type Target;

    fn loss(&self, prediction: &Self::Prediction, target: &Self::Target) -> Scalar<B>;

    fn grad_wrt_prediction(
        &self,
        prediction: &Self::Prediction,
        target: &Self::Target,
    ) -> Self::Prediction;
}

/// Mean Squared Error: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `(pred - target) / n`. The factor of 2 is left
/// to the learning rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl<B: Backend> Loss<B> for MSELoss {
    type Prediction = Tensor1D<B>;
    type Target = Tensor1D<B>;

    fn loss(&self, pred: &Self::Prediction, target: &Self::Target) -> Scalar<B> {
        let diff = pred.sub(target);
        diff.dot(&diff) / Scalar::<B>::new(diff.len() as f64)
    }

    fn grad_wrt_prediction(&self, pred: &Self::Prediction, target: &Self::Target) -> Tensor1D<B> {
        let n = Scalar::<B>::new(1.0 / pred.len() as f64);
        pred.sub(target).scale(&n)
    }
}
