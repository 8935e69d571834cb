//! Raw Open-Meteo archive exports.
//!
//! An export starts with a location metadata block (a header line and a value
//! line), usually followed by a blank line, before the hourly table:
//!
//! ```text
//! latitude,longitude,elevation,utc_offset_seconds,timezone,timezone_abbreviation
//! 50.06,19.94,219.0,0,GMT,GMT
//!
//! time,temperature_2m (°C),relative_humidity_2m (%),surface_pressure (hPa),wind_speed_10m (m/s),precipitation (mm)
//! 2023-01-01T00:00,4.1,88,1003.2,3.4,0.00
//! ```

use super::clean::{clean, MissingValuePolicy};
use super::store::parse_timestamp;
use crate::core::{Observation, PHYSICAL_COLUMNS, PHYSICAL_COUNT};
use crate::error::{MeteoError, Result};
use std::fs;
use std::path::Path;

/// Raw export header and the internal column it maps to.
pub const COLUMN_RENAMES: [(&str, &str); 6] = [
    ("time", "timestamp"),
    ("temperature_2m (°C)", "temperature"),
    ("relative_humidity_2m (%)", "humidity"),
    ("surface_pressure (hPa)", "pressure"),
    ("wind_speed_10m (m/s)", "wind_speed"),
    ("precipitation (mm)", "precipitation"),
];

/// Map a raw header to its internal name. Internal names map to themselves.
pub fn canonical_column(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    COLUMN_RENAMES
        .iter()
        .find(|(from, to)| *from == raw || *to == raw)
        .map(|(_, to)| *to)
}

/// Parse the text of a raw export into observations ordered by time.
///
/// Empty cells and `NaN` are missing values and are resolved with `policy`.
pub fn parse_raw_csv(text: &str, policy: MissingValuePolicy) -> Result<Vec<Observation>> {
    let table = table_section(text)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(table.as_bytes());

    let headers = reader.headers()?.clone();
    let mapped: Vec<Option<&str>> = headers.iter().map(canonical_column).collect();

    let position = |name: &str| mapped.iter().position(|m| *m == Some(name));
    let mut missing = Vec::new();
    let ts_col = position("timestamp");
    if ts_col.is_none() {
        missing.push("timestamp".to_string());
    }
    let mut physical_cols = [0usize; PHYSICAL_COUNT];
    for (i, name) in PHYSICAL_COLUMNS.iter().enumerate() {
        match position(name) {
            Some(col) => physical_cols[i] = col,
            None => missing.push(name.to_string()),
        }
    }
    let ts_col = match ts_col {
        Some(col) if missing.is_empty() => col,
        _ => {
            return Err(MeteoError::SchemaMismatch {
                missing,
                unexpected: Vec::new(),
            })
        }
    };

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw_ts = record.get(ts_col).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts)?;
        let mut values = [f64::NAN; PHYSICAL_COUNT];
        for (i, &col) in physical_cols.iter().enumerate() {
            values[i] = parse_cell(record.get(col).unwrap_or_default(), PHYSICAL_COLUMNS[i])?;
        }
        observations.push(Observation::from_physical(timestamp, values));
    }
    observations.sort_by_key(|o| o.timestamp);

    let (observations, affected) = clean(observations, policy)?;
    if affected > 0 {
        tracing::warn!(affected, ?policy, "resolved missing values in raw export");
    }
    Ok(observations)
}

/// Load a raw export from disk.
pub fn load_raw_csv(path: impl AsRef<Path>, policy: MissingValuePolicy) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MeteoError::missing_artifact(
            path,
            "run the fetch step to download the raw archive export",
        ));
    }
    let text = fs::read_to_string(path)?;
    let observations = parse_raw_csv(&text, policy)?;
    tracing::info!(path = %path.display(), rows = observations.len(), "loaded raw export");
    Ok(observations)
}

fn parse_cell(raw: &str, column: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .map_err(|_| MeteoError::Parse(format!("invalid {column} value '{raw}'")))
}

/// Slice off everything before the hourly table header.
fn table_section(text: &str) -> Result<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let first = line.split(',').next().unwrap_or_default().trim();
        if canonical_column(first) == Some("timestamp") {
            return Ok(&text[offset..]);
        }
        offset += line.len();
    }
    Err(MeteoError::SchemaMismatch {
        missing: vec!["timestamp".to_string()],
        unexpected: Vec::new(),
    })
}
