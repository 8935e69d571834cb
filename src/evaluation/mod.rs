//! One-step accuracy of a model on a held-out partition.
//!
//! Each window of the partition is fed to the model once. Predictions go
//! through the same clamping, denormalization and physical constraints as a
//! live forecast; targets are only denormalized. Metrics are reported per
//! physical field in real units.

pub mod metrics;

pub use metrics::{calculate_metrics, mae, mse, rmse, AccuracyMetrics};

use crate::core::{ScaledRow, PHYSICAL_COLUMNS, PHYSICAL_COUNT, PRECIPITATION};
use crate::error::{MeteoError, Result};
use crate::forecast::{denormalize_output, ForecastConfig};
use crate::models::StepModel;
use crate::transform::{FeatureScaler, SequenceWindower, WindowConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Per-field accuracy of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: String,
    pub samples: usize,
    /// Keyed by physical column name.
    pub metrics: BTreeMap<String, AccuracyMetrics>,
}

impl EvaluationReport {
    pub fn get(&self, column: &str) -> Option<&AccuracyMetrics> {
        self.metrics.get(column)
    }

    /// Flat `{column}_{metric}` map, as written by [`EvaluationReport::save`].
    pub fn flat(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (column, m) in &self.metrics {
            out.insert(format!("{column}_mae"), m.mae);
            out.insert(format!("{column}_rmse"), m.rmse);
            out.insert(format!("{column}_r2"), m.r_squared);
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&self.flat())?)?;
        Ok(())
    }
}

/// Score `model` on every contiguous window of `rows`.
///
/// The window config must target the five physical fields in canonical order.
///
/// # Errors
/// `InsufficientData` when `rows` yields no window, `ModelInvocation` when the
/// model fails on any window.
pub fn evaluate<M, S>(
    model: &M,
    scaler: &S,
    rows: &[ScaledRow],
    window: &WindowConfig,
    forecast: &ForecastConfig,
) -> Result<EvaluationReport>
where
    M: StepModel + ?Sized,
    S: FeatureScaler + ?Sized,
{
    if window.target_columns.iter().copied().ne(0..PHYSICAL_COUNT) {
        return Err(MeteoError::InvalidParameter(
            "evaluation needs the physical fields as targets".to_string(),
        ));
    }
    let windower = SequenceWindower::new(window.clone())?;
    let pairs = windower.windows_by_segment(rows);
    if pairs.is_empty() {
        return Err(MeteoError::InsufficientData {
            needed: window.lookback + window.horizon + 1,
            got: rows.len(),
        });
    }

    let mut truth: Vec<Vec<f64>> = vec![Vec::with_capacity(pairs.len()); PHYSICAL_COUNT];
    let mut predicted: Vec<Vec<f64>> = vec![Vec::with_capacity(pairs.len()); PHYSICAL_COUNT];

    for (i, pair) in pairs.iter().enumerate() {
        let output = model
            .predict(&pair.input)
            .map_err(|e| MeteoError::ModelInvocation(format!("window {i}: {e}")))?;
        let pred = denormalize_output(scaler, &output, forecast)?;
        let actual = denormalize_target(scaler, &pair.target, forecast)?;
        for c in 0..PHYSICAL_COUNT {
            truth[c].push(actual[c]);
            predicted[c].push(pred[c]);
        }
    }

    let mut metrics = BTreeMap::new();
    for (c, name) in PHYSICAL_COLUMNS.iter().enumerate() {
        let m = calculate_metrics(&truth[c], &predicted[c])?;
        tracing::info!(column = *name, mae = m.mae, rmse = m.rmse, r2 = m.r_squared, "evaluation");
        metrics.insert(name.to_string(), m);
    }

    Ok(EvaluationReport {
        model: model.name().to_string(),
        samples: pairs.len(),
        metrics,
    })
}

fn denormalize_target<S: FeatureScaler + ?Sized>(
    scaler: &S,
    target: &[f64],
    config: &ForecastConfig,
) -> Result<[f64; PHYSICAL_COUNT]> {
    let mut padded = vec![0.0; scaler.n_features()];
    padded[..PHYSICAL_COUNT].copy_from_slice(&target[..PHYSICAL_COUNT]);
    let restored = scaler.inverse_transform_row(&padded)?;
    let mut physical = [0.0; PHYSICAL_COUNT];
    physical.copy_from_slice(&restored[..PHYSICAL_COUNT]);
    physical[PRECIPITATION] = config.precipitation_transform.inverse(physical[PRECIPITATION]);
    Ok(physical)
}
