//! Synthetic extreme-event injection.
//!
//! Calm weather dominates any hourly record, so a model trained on history
//! alone rarely sees heatwaves, storms or late frost. The generator adds
//! labeled synthetic rows for those regimes and tops up the set with
//! noise-perturbed copies of real rows.
//!
//! # Example
//!
//! ```
//! use meteo_forecast::synthetic::{SyntheticConfig, SyntheticGenerator};
//!
//! let config = SyntheticConfig::default().with_seed(42);
//! let mut generator = SyntheticGenerator::new(config).unwrap();
//!
//! let heat = generator.heatwave(100);
//! assert_eq!(heat.len(), 100);
//! assert!(heat.iter().all(|row| row.is_synthetic()));
//! ```

pub mod noise;
pub mod scenario;

pub use noise::{augment, NoiseConfig};
pub use scenario::{clip_physical, random_timestamps, FieldSpec, ScenarioConfig};

use crate::core::FeatureRow;
use crate::error::{MeteoError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for synthetic data generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Total number of synthetic rows to produce.
    pub target_samples: usize,
    /// Random seed for reproducibility (None for random).
    pub seed: Option<u64>,
    /// Calendar year synthetic timestamps are placed in.
    pub reference_year: i32,
    pub heatwave: ScenarioConfig,
    pub storm: ScenarioConfig,
    pub late_frost: ScenarioConfig,
    pub noise: NoiseConfig,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            target_samples: 25_000,
            seed: None,
            reference_year: 2022,
            heatwave: ScenarioConfig::heatwave(),
            storm: ScenarioConfig::storm(),
            late_frost: ScenarioConfig::late_frost(),
            noise: NoiseConfig::default(),
        }
    }
}

impl SyntheticConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_target_samples(mut self, target: usize) -> Self {
        self.target_samples = target;
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Sum of the configured scenario counts.
    pub fn scenario_total(&self) -> usize {
        self.heatwave.count + self.storm.count + self.late_frost.count
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=9999).contains(&self.reference_year) {
            return Err(MeteoError::InvalidParameter(format!(
                "reference year {} out of range",
                self.reference_year
            )));
        }
        self.heatwave.validate()?;
        self.storm.validate()?;
        self.late_frost.validate()?;
        self.noise.validate()
    }
}

/// Row counts of one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntheticSummary {
    pub heatwave: usize,
    pub storm: usize,
    pub late_frost: usize,
    pub noise: usize,
}

impl SyntheticSummary {
    pub fn total(&self) -> usize {
        self.heatwave + self.storm + self.late_frost + self.noise
    }
}

/// Seeded generator for synthetic training rows.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// `n` heatwave rows from the configured summer months.
    pub fn heatwave(&mut self, n: usize) -> Vec<FeatureRow> {
        self.config
            .heatwave
            .sample(self.config.reference_year, n, &mut self.rng)
    }

    /// `n` storm rows.
    pub fn storm(&mut self, n: usize) -> Vec<FeatureRow> {
        self.config
            .storm
            .sample(self.config.reference_year, n, &mut self.rng)
    }

    /// `n` late-frost rows from the configured transitional months.
    pub fn late_frost(&mut self, n: usize) -> Vec<FeatureRow> {
        self.config
            .late_frost
            .sample(self.config.reference_year, n, &mut self.rng)
    }

    /// `n` noisy resamples of `real`.
    pub fn noise(&mut self, real: &[FeatureRow], n: usize) -> Vec<FeatureRow> {
        augment(real, n, &self.config.noise, &mut self.rng)
    }

    /// Build the full synthetic set.
    ///
    /// All scenarios are produced at their configured counts, then noise
    /// rows fill the gap up to `target_samples`. Without real rows to
    /// resample, the noise share is skipped and the result is smaller.
    pub fn generate(&mut self, real: &[FeatureRow]) -> Vec<FeatureRow> {
        self.generate_with_summary(real).0
    }

    /// As [`SyntheticGenerator::generate`], also returning per-source counts.
    pub fn generate_with_summary(&mut self, real: &[FeatureRow]) -> (Vec<FeatureRow>, SyntheticSummary) {
        let mut rows = Vec::with_capacity(self.config.target_samples.max(self.config.scenario_total()));

        let heat = self.heatwave(self.config.heatwave.count);
        let storm = self.storm(self.config.storm.count);
        let frost = self.late_frost(self.config.late_frost.count);

        let mut summary = SyntheticSummary {
            heatwave: heat.len(),
            storm: storm.len(),
            late_frost: frost.len(),
            noise: 0,
        };

        rows.extend(heat);
        rows.extend(storm);
        rows.extend(frost);

        let remaining = self.config.target_samples.saturating_sub(rows.len());
        if remaining > 0 {
            if real.is_empty() {
                tracing::warn!(
                    remaining,
                    "no real rows to resample, skipping noise augmentation"
                );
            } else {
                let noisy = self.noise(real, remaining);
                summary.noise = noisy.len();
                rows.extend(noisy);
            }
        }

        tracing::info!(
            heatwave = summary.heatwave,
            storm = summary.storm,
            late_frost = summary.late_frost,
            noise = summary.noise,
            total = summary.total(),
            target = self.config.target_samples,
            "generated synthetic rows"
        );

        (rows, summary)
    }
}
