//! CSV persistence for feature rows and scaled partitions.
//!
//! Both tables share one layout: a `timestamp` column (RFC 3339, UTC), the
//! nine feature columns and an `is_synthetic` flag. Feature-row files may omit
//! the time columns; they are recomputed from the timestamp on read.

use crate::core::{
    FeatureRow, Observation, ScaledRow, FEATURE_COLUMNS, FEATURE_COUNT, PHYSICAL_COLUMNS,
    PHYSICAL_COUNT,
};
use crate::error::{MeteoError, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use csv::StringRecord;
use std::fs::{self, File};
use std::path::Path;

const SYNTHETIC_COLUMN: &str = "is_synthetic";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(FEATURE_COUNT + 2);
    header.push("timestamp");
    header.extend(FEATURE_COLUMNS);
    header.push(SYNTHETIC_COLUMN);
    header
}

/// Parse a timestamp in RFC 3339 or one of the naive ISO layouts (read as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| MeteoError::Parse(format!("unrecognized timestamp '{raw}'")))
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(MeteoError::Parse(format!("invalid {SYNTHETIC_COLUMN} value '{other}'"))),
    }
}

fn parse_value(raw: &str, column: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| MeteoError::Parse(format!("invalid {column} value '{raw}'")))
}

/// Resolve the position of each named column in `headers`.
fn locate(headers: &StringRecord, columns: &[&str]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(columns.len());
    let mut missing = Vec::new();
    for column in columns {
        match headers.iter().position(|h| h.trim() == *column) {
            Some(pos) => positions.push(pos),
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(MeteoError::SchemaMismatch {
            missing,
            unexpected: Vec::new(),
        });
    }
    Ok(positions)
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(csv::Writer::from_path(path)?)
}

fn open_reader(path: &Path, hint: &str) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(MeteoError::missing_artifact(path, hint));
    }
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?)
}

fn write_rows<I>(path: &Path, rows: I) -> Result<usize>
where
    I: Iterator<Item = (DateTime<Utc>, [f64; FEATURE_COUNT], bool)>,
{
    let mut writer = create_writer(path)?;
    writer.write_record(header())?;
    let mut count = 0;
    for (timestamp, features, is_synthetic) in rows {
        let mut record = Vec::with_capacity(FEATURE_COUNT + 2);
        record.push(format_timestamp(&timestamp));
        record.extend(features.iter().map(|v| v.to_string()));
        record.push(if is_synthetic { "1" } else { "0" }.to_string());
        writer.write_record(&record)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Write a scaled partition.
pub fn write_scaled_rows(path: impl AsRef<Path>, rows: &[ScaledRow]) -> Result<()> {
    let path = path.as_ref();
    let count = write_rows(path, rows.iter().map(|r| (r.timestamp, r.features, r.is_synthetic)))?;
    tracing::debug!(path = %path.display(), rows = count, "wrote scaled rows");
    Ok(())
}

/// Read a scaled partition written by [`write_scaled_rows`].
pub fn read_scaled_rows(path: impl AsRef<Path>) -> Result<Vec<ScaledRow>> {
    let path = path.as_ref();
    let mut reader = open_reader(path, "run the partition step to write the dataset partitions")?;
    let headers = reader.headers()?.clone();
    let ts_col = locate(&headers, &["timestamp"])?[0];
    let feature_cols = locate(&headers, &FEATURE_COLUMNS)?;
    let flag_col = locate(&headers, &[SYNTHETIC_COLUMN])?[0];

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let timestamp = parse_timestamp(field(&record, ts_col)?)?;
        let mut features = [0.0; FEATURE_COUNT];
        for (i, &col) in feature_cols.iter().enumerate() {
            features[i] = parse_value(field(&record, col)?, FEATURE_COLUMNS[i])?;
        }
        let is_synthetic = parse_flag(field(&record, flag_col)?)?;
        rows.push(ScaledRow::new(timestamp, features, is_synthetic));
    }
    Ok(rows)
}

/// Write feature rows (the hybrid real + synthetic table) in unscaled units.
pub fn write_feature_rows(path: impl AsRef<Path>, rows: &[FeatureRow]) -> Result<()> {
    let path = path.as_ref();
    let count = write_rows(path, rows.iter().map(|r| (r.timestamp(), r.features(), r.is_synthetic())))?;
    tracing::debug!(path = %path.display(), rows = count, "wrote feature rows");
    Ok(())
}

/// Read feature rows. Time columns, if present, are ignored.
///
/// A missing `is_synthetic` column marks every row as real.
pub fn read_feature_rows(path: impl AsRef<Path>) -> Result<Vec<FeatureRow>> {
    let path = path.as_ref();
    let mut reader = open_reader(path, "run the synthetic step to write the hybrid dataset")?;
    let headers = reader.headers()?.clone();
    let ts_col = locate(&headers, &["timestamp"])?[0];
    let physical_cols = locate(&headers, &PHYSICAL_COLUMNS)?;
    let flag_col = headers.iter().position(|h| h.trim() == SYNTHETIC_COLUMN);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let timestamp = parse_timestamp(field(&record, ts_col)?)?;
        let mut values = [0.0; PHYSICAL_COUNT];
        for (i, &col) in physical_cols.iter().enumerate() {
            values[i] = parse_value(field(&record, col)?, PHYSICAL_COLUMNS[i])?;
        }
        let observation = Observation::from_physical(timestamp, values);
        let synthetic = match flag_col {
            Some(col) => parse_flag(field(&record, col)?)?,
            None => false,
        };
        rows.push(if synthetic {
            FeatureRow::synthetic(observation)
        } else {
            FeatureRow::real(observation)
        });
    }
    Ok(rows)
}

fn field(record: &StringRecord, col: usize) -> Result<&str> {
    record.get(col).ok_or_else(|| {
        MeteoError::Parse(format!(
            "record at line {} has no column {col}",
            record.position().map_or(0, |p| p.line())
        ))
    })
}
