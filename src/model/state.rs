/// Marker for a model that has **not yet been trained**.
///
/// Training methods (like `Trainer::fit`) take an `Unfitted` model; inference
/// (`predict`) is only implemented for [`Fitted`].
#[derive(Debug, Clone, Copy)]
pub struct Unfitted;

/// Marker for a **trained** model.
///
/// A fitted model carries only inference parameters: no optimizer state and
/// no training hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct Fitted;
