//! Variance-compressing transform for precipitation.
//!
//! Hourly rainfall is heavily right-skewed. Training on `ln(1 + x)` keeps the
//! rare downpours from dominating the min-max range.

use serde::{Deserialize, Serialize};

/// Transform applied to the precipitation column before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationTransform {
    /// Raw millimetres.
    #[default]
    Identity,
    /// `ln(1 + x)` forward, `exp(y) - 1` inverse.
    Log1p,
}

impl PrecipitationTransform {
    pub fn forward(self, value: f64) -> f64 {
        match self {
            PrecipitationTransform::Identity => value,
            PrecipitationTransform::Log1p => value.ln_1p(),
        }
    }

    pub fn inverse(self, value: f64) -> f64 {
        match self {
            PrecipitationTransform::Identity => value,
            PrecipitationTransform::Log1p => value.exp_m1(),
        }
    }

    pub fn is_identity(self) -> bool {
        self == PrecipitationTransform::Identity
    }
}
