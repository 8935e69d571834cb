//! Gaussian noise augmentation of real observations.

use super::scenario::clip_physical;
use crate::core::{FeatureRow, Observation, PHYSICAL_COUNT};
use crate::error::{MeteoError, Result};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// Per-field standard deviation of the added noise.
///
/// A zero sigma leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub temperature_sigma: f64,
    pub humidity_sigma: f64,
    pub pressure_sigma: f64,
    pub wind_speed_sigma: f64,
    pub precipitation_sigma: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            temperature_sigma: 0.5,
            humidity_sigma: 2.0,
            pressure_sigma: 0.0,
            wind_speed_sigma: 0.0,
            precipitation_sigma: 0.0,
        }
    }
}

impl NoiseConfig {
    fn sigmas(&self) -> [f64; PHYSICAL_COUNT] {
        [
            self.temperature_sigma,
            self.humidity_sigma,
            self.pressure_sigma,
            self.wind_speed_sigma,
            self.precipitation_sigma,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.sigmas().iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(MeteoError::InvalidParameter(
                "noise sigmas must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resample `n` real rows with replacement and perturb their physical fields.
///
/// Timestamps are kept, so each noisy row keeps the season of its source.
/// Returns an empty vector when `real` is empty.
pub fn augment<R: Rng + ?Sized>(
    real: &[FeatureRow],
    n: usize,
    config: &NoiseConfig,
    rng: &mut R,
) -> Vec<FeatureRow> {
    if real.is_empty() || n == 0 {
        return Vec::new();
    }

    let noise: Vec<Option<Normal>> = config
        .sigmas()
        .iter()
        .map(|&s| if s > 0.0 { Normal::new(0.0, s).ok() } else { None })
        .collect();

    (0..n)
        .map(|_| {
            let source = real[rng.gen_range(0..real.len())].observation();
            let mut values = source.physical();
            for (v, dist) in values.iter_mut().zip(&noise) {
                if let Some(dist) = dist {
                    *v += dist.sample(rng);
                }
            }
            clip_physical(&mut values);
            FeatureRow::synthetic(Observation::from_physical(source.timestamp, values))
        })
        .collect()
}
