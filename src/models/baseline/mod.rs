//! Baseline step models.
//!
//! Simple predictors that serve as benchmarks and as stand-ins for a trained
//! network in pipelines and tests.

mod naive;
mod sma;

pub use naive::Persistence;
pub use sma::WindowAverage;
