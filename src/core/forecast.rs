//! Forecast records produced by the autoregressive loop.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Coarse weather condition derived from a predicted hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Rain,
    Snow,
    Clear,
}

impl WeatherCondition {
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Rain => "rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Clear => "clear",
        }
    }

    pub fn is_precipitating(&self) -> bool {
        !matches!(self, WeatherCondition::Clear)
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One predicted future hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub condition: WeatherCondition,
}

/// Ordered predictions from a single forecast request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    records: Vec<ForecastRecord>,
}

impl ForecastTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(steps: usize) -> Self {
        Self {
            records: Vec::with_capacity(steps),
        }
    }

    pub(crate) fn push(&mut self, record: ForecastRecord) {
        self.records.push(record);
    }

    /// Number of forecast hours.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastRecord> {
        self.records.iter()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn max_temperature(&self) -> Option<f64> {
        self.fold_max(|r| r.temperature)
    }

    pub fn min_temperature(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.temperature)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
    }

    pub fn max_wind_speed(&self) -> Option<f64> {
        self.fold_max(|r| r.wind_speed)
    }

    pub fn max_precipitation(&self) -> Option<f64> {
        self.fold_max(|r| r.precipitation)
    }

    /// Total precipitation over the whole horizon.
    pub fn total_precipitation(&self) -> f64 {
        self.records.iter().map(|r| r.precipitation).sum()
    }

    fn fold_max<F>(&self, f: F) -> Option<f64>
    where
        F: Fn(&ForecastRecord) -> f64,
    {
        self.records
            .iter()
            .map(f)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }

    /// Render the table as CSV with a header row.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::MeteoError::Io(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| crate::error::MeteoError::Parse(e.to_string()))
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ForecastTable {
    type Item = &'a ForecastRecord;
    type IntoIter = std::slice::Iter<'a, ForecastRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
