//! Persistence model.
//!
//! Predicts that the next hour looks exactly like the last hour in the window.

use crate::core::PHYSICAL_COUNT;
use crate::error::{MeteoError, Result};
use crate::models::StepModel;

/// Repeats the physical fields of the most recent row.
#[derive(Debug, Clone, Copy, Default)]
pub struct Persistence;

impl Persistence {
    pub fn new() -> Self {
        Self
    }
}

impl StepModel for Persistence {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        let last = window
            .last()
            .ok_or(MeteoError::InsufficientData { needed: 1, got: 0 })?;
        if last.len() < PHYSICAL_COUNT {
            return Err(MeteoError::DimensionMismatch {
                expected: PHYSICAL_COUNT,
                got: last.len(),
            });
        }
        Ok(last[..PHYSICAL_COUNT].to_vec())
    }

    fn name(&self) -> &str {
        "Persistence"
    }
}
