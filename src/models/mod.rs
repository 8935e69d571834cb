//! Step models consumed by the autoregressive forecaster.

mod traits;

pub mod baseline;

pub use traits::{BoxedModel, FnModel, StepModel};
