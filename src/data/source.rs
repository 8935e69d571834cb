//! Upstream weather data sources.

use super::clean::MissingValuePolicy;
use super::loader::load_raw_csv;
use crate::core::Observation;
use crate::error::{MeteoError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A point on the map that a source can be queried for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name as understood by the archive API.
    pub timezone: String,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            timezone: "GMT".to_string(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(MeteoError::InvalidParameter(format!(
                "coordinates ({}, {}) out of range",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// Historical hourly observations for a location and an inclusive date range.
pub trait WeatherSource {
    fn fetch(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>>;
}

impl<T: WeatherSource + ?Sized> WeatherSource for &T {
    fn fetch(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>> {
        (**self).fetch(location, start, end)
    }
}

impl<T: WeatherSource + ?Sized> WeatherSource for Box<T> {
    fn fetch(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>> {
        (**self).fetch(location, start, end)
    }
}

/// Serves observations from a cached archive export on disk.
///
/// The file is read on every call; the location only has to be valid.
#[derive(Debug, Clone)]
pub struct CsvArchiveSource {
    path: PathBuf,
    policy: MissingValuePolicy,
}

impl CsvArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: MissingValuePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl WeatherSource for CsvArchiveSource {
    fn fetch(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>> {
        location.validate()?;
        if start > end {
            return Err(MeteoError::InvalidParameter(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let rows: Vec<Observation> = load_raw_csv(&self.path, self.policy)?
            .into_iter()
            .filter(|o| {
                let day = o.timestamp.date_naive();
                day >= start && day <= end
            })
            .collect();

        tracing::info!(
            location = %location.name,
            %start,
            %end,
            rows = rows.len(),
            "fetched observations from archive"
        );
        Ok(rows)
    }
}
