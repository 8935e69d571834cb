//! Window average model.
//!
//! Predicts each physical field as the mean of its last `span` values in the
//! input window. A span of 0, or one longer than the window, uses the whole
//! window.

use crate::core::PHYSICAL_COUNT;
use crate::error::{MeteoError, Result};
use crate::models::StepModel;

/// Mean of the most recent rows, per physical field.
#[derive(Debug, Clone, Copy)]
pub struct WindowAverage {
    span: usize, // 0 means the whole window
}

impl WindowAverage {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Default for WindowAverage {
    fn default() -> Self {
        Self::new(24)
    }
}

impl StepModel for WindowAverage {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        if window.is_empty() {
            return Err(MeteoError::InsufficientData { needed: 1, got: 0 });
        }
        let span = if self.span == 0 || self.span > window.len() {
            window.len()
        } else {
            self.span
        };
        let recent = &window[window.len() - span..];

        let mut sums = vec![0.0; PHYSICAL_COUNT];
        for row in recent {
            if row.len() < PHYSICAL_COUNT {
                return Err(MeteoError::DimensionMismatch {
                    expected: PHYSICAL_COUNT,
                    got: row.len(),
                });
            }
            for (sum, v) in sums.iter_mut().zip(row) {
                *sum += v;
            }
        }
        Ok(sums.into_iter().map(|s| s / span as f64).collect())
    }

    fn name(&self) -> &str {
        "WindowAverage"
    }
}
