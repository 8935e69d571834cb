//! Cyclical encoding of timestamps.
//!
//! Maps a timestamp onto the unit circle twice: once per day and once per
//! mean Gregorian year. The offline feature stage and the forecast feedback
//! loop both call [`encode`]; there is no second implementation.

use chrono::{DateTime, Utc};
use std::f64::consts::PI;

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds in a mean Gregorian year (365.2425 days).
pub const SECONDS_PER_YEAR: f64 = 31_556_952.0;

/// Sine/cosine pairs for the daily and yearly cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFeatures {
    pub day_sin: f64,
    pub day_cos: f64,
    pub year_sin: f64,
    pub year_cos: f64,
}

impl TimeFeatures {
    /// Layout matches `core::TIME_COLUMNS`.
    pub fn to_array(self) -> [f64; 4] {
        [self.day_sin, self.day_cos, self.year_sin, self.year_cos]
    }
}

/// Encode a timestamp as four cyclical features in [-1, 1].
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use meteo_forecast::transform::encode;
///
/// let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let features = encode(midnight);
/// assert!((features.day_cos - 1.0).abs() < 1e-9);
/// ```
pub fn encode(timestamp: DateTime<Utc>) -> TimeFeatures {
    encode_seconds(timestamp.timestamp() as f64)
}

/// Encode raw seconds since the Unix epoch.
pub fn encode_seconds(seconds: f64) -> TimeFeatures {
    let day_angle = 2.0 * PI * seconds / SECONDS_PER_DAY;
    let year_angle = 2.0 * PI * seconds / SECONDS_PER_YEAR;
    TimeFeatures {
        day_sin: day_angle.sin(),
        day_cos: day_angle.cos(),
        year_sin: year_angle.sin(),
        year_cos: year_angle.cos(),
    }
}
