//! Model traits and the multilayer perceptron regressor.
//!
//! Models use a type-state split: `Model<B, Unfitted>` implements
//! [`TrainableModel`] and is consumed by the trainer, which returns a
//! `Model<B, Fitted>` implementing [`InferenceModel`].

pub mod mlp;
pub mod state;

pub use mlp::{DenseParams, MlpParams, MlpRegressor, SerializableMlpParams};
pub use state::{Fitted, Unfitted};

use crate::backend::{Backend, Scalar};

pub trait TrainableModel<B: Backend> {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    /// Intermediate values kept from the forward pass for `backward`.
    type Activations;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;

    /// Forward pass that also returns what `backward` needs.
    fn forward_train(&self, input: &Self::Input) -> (Self::Prediction, Self::Activations);

    /// Gradients of the loss w.r.t. the parameters, given `∂L/∂prediction`.
    fn backward(
        &self,
        activations: &Self::Activations,
        grad_output: &Self::Prediction,
    ) -> Self::Gradients;

    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic over whole parameter sets, as needed by the optimizers.
pub trait ParamOps<B: Backend>: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: Scalar<B>) -> Self;
    /// Element-wise product.
    fn mul(&self, other: &Self) -> Self;
    /// Element-wise quotient.
    fn div(&self, other: &Self) -> Self;
    fn sqrt(&self) -> Self;
    fn add_scalar(&self, scalar: Scalar<B>) -> Self;
    /// Same shapes, all zeros.
    fn zeros_like(&self) -> Self;
}

pub trait InferenceModel<B: Backend> {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;
}
