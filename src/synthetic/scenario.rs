//! Extreme-weather scenario definitions and sampling.

use crate::core::{FeatureRow, Observation, PHYSICAL_COUNT};
use crate::error::{MeteoError, Result};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// How a single physical field is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Always the same value.
    Fixed { value: f64 },
    /// Uniform on `[min, max]`.
    Uniform { min: f64, max: f64 },
    /// Gaussian with the given mean and standard deviation.
    Normal { mean: f64, std_dev: f64 },
}

impl FieldSpec {
    pub fn fixed(value: f64) -> Self {
        FieldSpec::Fixed { value }
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        FieldSpec::Uniform { min, max }
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        FieldSpec::Normal { mean, std_dev }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            FieldSpec::Fixed { value } => value,
            FieldSpec::Uniform { min, max } => {
                if max > min {
                    rng.gen_range(min..=max)
                } else {
                    min
                }
            }
            FieldSpec::Normal { mean, std_dev } => match Normal::new(mean, std_dev) {
                Ok(dist) if std_dev > 0.0 => dist.sample(rng),
                _ => mean,
            },
        }
    }

    /// Inclusive bounds every sample falls in, if bounded.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            FieldSpec::Fixed { value } => Some((value, value)),
            FieldSpec::Uniform { min, max } => Some((min, max)),
            FieldSpec::Normal { .. } => None,
        }
    }

    fn validate(&self, field: &str) -> Result<()> {
        let ok = match *self {
            FieldSpec::Fixed { value } => value.is_finite(),
            FieldSpec::Uniform { min, max } => min.is_finite() && max.is_finite() && min <= max,
            FieldSpec::Normal { mean, std_dev } => {
                mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(MeteoError::InvalidParameter(format!(
                "invalid distribution for {field}: {self:?}"
            )))
        }
    }
}

/// One family of synthetic extreme events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// Rows generated when the full synthetic set is built.
    pub count: usize,
    /// Calendar months (1-12) event timestamps are drawn from.
    pub months: Vec<u32>,
    pub temperature: FieldSpec,
    pub humidity: FieldSpec,
    pub pressure: FieldSpec,
    pub wind_speed: FieldSpec,
    pub precipitation: FieldSpec,
}

impl ScenarioConfig {
    /// Summer heat: 40-44 °C, dry air, no rain.
    pub fn heatwave() -> Self {
        Self {
            name: "heatwave".to_string(),
            count: 2000,
            months: vec![6, 7, 8],
            temperature: FieldSpec::uniform(40.0, 44.0),
            humidity: FieldSpec::uniform(20.0, 40.0),
            pressure: FieldSpec::normal(1010.0, 5.0),
            wind_speed: FieldSpec::uniform(0.0, 10.0),
            precipitation: FieldSpec::fixed(0.0),
        }
    }

    /// Severe storm: gale winds, deep low pressure, heavy rain, saturated air.
    pub fn storm() -> Self {
        Self {
            name: "storm".to_string(),
            count: 2000,
            months: vec![3, 4, 5, 9, 10, 11],
            temperature: FieldSpec::uniform(10.0, 25.0),
            humidity: FieldSpec::uniform(80.0, 100.0),
            pressure: FieldSpec::uniform(970.0, 990.0),
            wind_speed: FieldSpec::uniform(20.0, 30.0),
            precipitation: FieldSpec::uniform(1.0, 15.0),
        }
    }

    /// Clear-sky spring frost.
    pub fn late_frost() -> Self {
        Self {
            name: "late_frost".to_string(),
            count: 1000,
            months: vec![4, 5],
            temperature: FieldSpec::uniform(-3.0, 0.0),
            humidity: FieldSpec::uniform(40.0, 70.0),
            pressure: FieldSpec::uniform(1015.0, 1030.0),
            wind_speed: FieldSpec::uniform(0.0, 5.0),
            precipitation: FieldSpec::fixed(0.0),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_months(mut self, months: Vec<u32>) -> Self {
        self.months = months;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.months.is_empty() {
            return Err(MeteoError::InvalidParameter(format!(
                "scenario {} has no months",
                self.name
            )));
        }
        if let Some(m) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(MeteoError::InvalidParameter(format!(
                "scenario {} has invalid month {m}",
                self.name
            )));
        }
        self.temperature.validate("temperature")?;
        self.humidity.validate("humidity")?;
        self.pressure.validate("pressure")?;
        self.wind_speed.validate("wind_speed")?;
        self.precipitation.validate("precipitation")?;
        Ok(())
    }

    fn fields(&self) -> [&FieldSpec; PHYSICAL_COUNT] {
        [
            &self.temperature,
            &self.humidity,
            &self.pressure,
            &self.wind_speed,
            &self.precipitation,
        ]
    }

    /// Draw `n` rows for this scenario within `year`.
    ///
    /// Returns fewer rows only when none of the months yields a valid hour.
    pub fn sample<R: Rng + ?Sized>(&self, year: i32, n: usize, rng: &mut R) -> Vec<FeatureRow> {
        let timestamps = random_timestamps(year, &self.months, n, rng);
        if timestamps.len() < n {
            tracing::warn!(
                scenario = %self.name,
                requested = n,
                produced = timestamps.len(),
                "no candidate hours for scenario months"
            );
        }

        timestamps
            .into_iter()
            .map(|ts| {
                let mut values = [0.0; PHYSICAL_COUNT];
                for (v, spec) in values.iter_mut().zip(self.fields()) {
                    *v = spec.sample(rng);
                }
                clip_physical(&mut values);
                FeatureRow::synthetic(Observation::from_physical(ts, values))
            })
            .collect()
    }
}

/// Clip physical values to their valid ranges.
///
/// Humidity to [0, 100], wind speed and precipitation to non-negative.
pub fn clip_physical(values: &mut [f64; PHYSICAL_COUNT]) {
    use crate::core::{HUMIDITY, PRECIPITATION, WIND_SPEED};
    values[HUMIDITY] = values[HUMIDITY].clamp(0.0, 100.0);
    values[WIND_SPEED] = values[WIND_SPEED].max(0.0);
    values[PRECIPITATION] = values[PRECIPITATION].max(0.0);
}

/// Draw `n` hourly timestamps uniformly from the given months of `year`.
///
/// Sampling is with replacement and weighted by month length, so every hour
/// in the selected months is equally likely.
pub fn random_timestamps<R: Rng + ?Sized>(
    year: i32,
    months: &[u32],
    n: usize,
    rng: &mut R,
) -> Vec<DateTime<Utc>> {
    let spans: Vec<(DateTime<Utc>, i64)> = months
        .iter()
        .filter_map(|&m| month_span(year, m))
        .collect();
    let total: i64 = spans.iter().map(|(_, hours)| hours).sum();
    if total == 0 {
        return Vec::new();
    }

    (0..n)
        .map(|_| {
            let mut offset = rng.gen_range(0..total);
            for &(start, hours) in &spans {
                if offset < hours {
                    return start + Duration::hours(offset);
                }
                offset -= hours;
            }
            // Unreachable while offset < total.
            spans[0].0
        })
        .collect()
}

/// First instant of a month and its length in hours.
fn month_span(year: i32, month: u32) -> Option<(DateTime<Utc>, i64)> {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    debug_assert_eq!(start.month(), month);
    Some((start, (end - start).num_hours()))
}
