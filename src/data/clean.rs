//! Missing-value handling for raw observation tables.

use crate::core::{Observation, PHYSICAL_COLUMNS, PHYSICAL_COUNT};
use crate::error::{MeteoError, Result};
use serde::{Deserialize, Serialize};

/// Policy for handling missing physical values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Linear interpolation inside gaps, nearest value at the edges.
    #[default]
    Interpolate,
    /// Drop observations with any missing field.
    Drop,
    /// Return an error if missing values are found.
    Error,
}

/// Apply `policy` to a table of observations.
///
/// Returns the cleaned table and the number of values filled or rows dropped.
pub fn clean(
    observations: Vec<Observation>,
    policy: MissingValuePolicy,
) -> Result<(Vec<Observation>, usize)> {
    match policy {
        MissingValuePolicy::Error => {
            if let Some(pos) = observations.iter().position(|o| o.has_missing()) {
                return Err(MeteoError::Parse(format!(
                    "missing value in row {pos} ({})",
                    observations[pos].timestamp
                )));
            }
            Ok((observations, 0))
        }
        MissingValuePolicy::Drop => {
            let before = observations.len();
            let kept: Vec<Observation> = observations.into_iter().filter(|o| !o.has_missing()).collect();
            let dropped = before - kept.len();
            Ok((kept, dropped))
        }
        MissingValuePolicy::Interpolate => {
            let mut columns: Vec<Vec<f64>> = (0..PHYSICAL_COUNT)
                .map(|c| observations.iter().map(|o| o.physical()[c]).collect())
                .collect();

            let mut filled = 0;
            for (c, column) in columns.iter_mut().enumerate() {
                if !column.is_empty() && column.iter().all(|v| !v.is_finite()) {
                    tracing::warn!(column = PHYSICAL_COLUMNS[c], "column has no values");
                    return Err(MeteoError::InsufficientData { needed: 1, got: 0 });
                }
                filled += interpolate_series(column);
            }

            let cleaned = observations
                .iter()
                .enumerate()
                .map(|(i, o)| {
                    let mut values = [0.0; PHYSICAL_COUNT];
                    for (c, v) in values.iter_mut().enumerate() {
                        *v = columns[c][i];
                    }
                    Observation::from_physical(o.timestamp, values)
                })
                .collect();
            Ok((cleaned, filled))
        }
    }
}

/// Fill non-finite values in place; returns how many were filled.
///
/// Interior gaps are interpolated linearly between their neighbours. Leading
/// and trailing gaps take the nearest valid value.
pub fn interpolate_series(values: &mut [f64]) -> usize {
    let n = values.len();
    let mut filled = 0;
    let mut i = 0;

    while i < n {
        if values[i].is_finite() {
            i += 1;
            continue;
        }

        let start = i;
        while i < n && !values[i].is_finite() {
            i += 1;
        }
        let end = i;

        let left = if start > 0 { Some(values[start - 1]) } else { None };
        let right = if end < n { Some(values[end]) } else { None };

        match (left, right) {
            (Some(l), Some(r)) => {
                let segments = (end - start + 1) as f64;
                for (j, idx) in (start..end).enumerate() {
                    let t = (j + 1) as f64 / segments;
                    values[idx] = l + t * (r - l);
                }
            }
            (Some(l), None) => values[start..end].fill(l),
            (None, Some(r)) => values[start..end].fill(r),
            (None, None) => continue,
        }
        filled += end - start;
    }

    filled
}
