//! Fit/transform contract shared by the scalers.

use crate::backend::Backend;
use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// An unfitted scaler: hyperparameters only.
///
/// `fit` consumes nothing, so one configured scaler can be fitted on several
/// datasets.
pub trait Transformer<B: Backend>: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;
    type Fitted: FittedTransformer<
        B,
        Params = Self::Params,
        Input = Self::Input,
        Output = Self::Output,
    >;

    /// Learns per-column statistics from `data`.
    ///
    /// # Errors
    /// [`PreprocessingError::EmptyData`] for zero rows, or a shape error.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;

    fn fit_transform(
        &self,
        data: &Self::Input,
    ) -> Result<(Self::Fitted, Self::Output), PreprocessingError> {
        let fitted = self.fit(data)?;
        let output = fitted.transform(data)?;
        Ok((fitted, output))
    }
}

/// A fitted scaler. Never refits: `transform` only applies what `fit` learned.
///
/// `inverse_transform(transform(x))` reconstructs `x` up to rounding, except in
/// zero-range columns, which collapse to the lower bound.
pub trait FittedTransformer<B: Backend>: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError>;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Column count seen during `fit`.
    fn n_features_in(&self) -> usize;
}
