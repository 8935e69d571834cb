//! Hourly observations and the feature rows derived from them.

use crate::transform::time_encoding::{encode, TimeFeatures};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of physical fields per observation.
pub const PHYSICAL_COUNT: usize = 5;

/// Number of model input features (physical fields + cyclical time features).
pub const FEATURE_COUNT: usize = 9;

/// Physical columns, in model order.
pub const PHYSICAL_COLUMNS: [&str; PHYSICAL_COUNT] = [
    "temperature",
    "humidity",
    "pressure",
    "wind_speed",
    "precipitation",
];

/// Cyclical time columns, in model order.
pub const TIME_COLUMNS: [&str; 4] = ["day_sin", "day_cos", "year_sin", "year_cos"];

/// All model input columns, in model order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "temperature",
    "humidity",
    "pressure",
    "wind_speed",
    "precipitation",
    "day_sin",
    "day_cos",
    "year_sin",
    "year_cos",
];

pub const TEMPERATURE: usize = 0;
pub const HUMIDITY: usize = 1;
pub const PRESSURE: usize = 2;
pub const WIND_SPEED: usize = 3;
pub const PRECIPITATION: usize = 4;

/// One hour of atmospheric state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent, [0, 100].
    pub humidity: f64,
    /// Surface pressure in hPa.
    pub pressure: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Precipitation in mm, never negative.
    pub precipitation: f64,
}

impl Observation {
    pub fn new(
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        pressure: f64,
        wind_speed: f64,
        precipitation: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            pressure,
            wind_speed,
            precipitation,
        }
    }

    /// Build from a physical vector laid out as [`PHYSICAL_COLUMNS`].
    pub fn from_physical(timestamp: DateTime<Utc>, values: [f64; PHYSICAL_COUNT]) -> Self {
        Self::new(
            timestamp,
            values[TEMPERATURE],
            values[HUMIDITY],
            values[PRESSURE],
            values[WIND_SPEED],
            values[PRECIPITATION],
        )
    }

    /// Physical fields as a vector laid out as [`PHYSICAL_COLUMNS`].
    pub fn physical(&self) -> [f64; PHYSICAL_COUNT] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.wind_speed,
            self.precipitation,
        ]
    }

    /// Check whether any physical field is NaN or infinite.
    pub fn has_missing(&self) -> bool {
        self.physical().iter().any(|v| !v.is_finite())
    }
}

/// An observation tagged with its provenance.
///
/// Time features are never stored: they are recomputed from the timestamp
/// with [`encode`] whenever [`FeatureRow::features`] is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    observation: Observation,
    is_synthetic: bool,
}

impl FeatureRow {
    /// A row measured by a real station.
    pub fn real(observation: Observation) -> Self {
        Self {
            observation,
            is_synthetic: false,
        }
    }

    /// A generated row used only for training augmentation.
    pub fn synthetic(observation: Observation) -> Self {
        Self {
            observation,
            is_synthetic: true,
        }
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.observation.timestamp
    }

    pub fn is_synthetic(&self) -> bool {
        self.is_synthetic
    }

    pub fn time_features(&self) -> TimeFeatures {
        encode(self.observation.timestamp)
    }

    /// Full 9-wide feature vector laid out as [`FEATURE_COLUMNS`].
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        out[..PHYSICAL_COUNT].copy_from_slice(&self.observation.physical());
        out[PHYSICAL_COUNT..].copy_from_slice(&self.time_features().to_array());
        out
    }
}

/// A normalized row as persisted in a dataset partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledRow {
    pub timestamp: DateTime<Utc>,
    pub features: [f64; FEATURE_COUNT],
    pub is_synthetic: bool,
}

impl ScaledRow {
    pub fn new(timestamp: DateTime<Utc>, features: [f64; FEATURE_COUNT], is_synthetic: bool) -> Self {
        Self {
            timestamp,
            features,
            is_synthetic,
        }
    }
}
