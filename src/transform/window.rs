//! Sliding-window sequence construction for single-step training.
//!
//! Windows never read past either end of the input and rows are consumed in
//! their existing order.

use crate::core::{ScaledRow, FEATURE_COUNT, PHYSICAL_COUNT};
use crate::error::{MeteoError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// One training example: a lookback window and the target it should predict.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePair {
    /// `lookback` rows of input features.
    pub input: Vec<Vec<f64>>,
    /// Target columns of the row `horizon` steps after the window.
    pub target: Vec<f64>,
}

/// Slice `rows` into `(input, target)` pairs.
///
/// For every `i` in `[lookback, len - horizon)` the input is rows
/// `[i - lookback, i)` and the target is the `target_columns` of row
/// `i + horizon`. Inputs with `rows.len() <= lookback + horizon` produce an
/// empty result.
///
/// # Arguments
/// * `rows` - Feature rows in chronological order
/// * `lookback` - Window length
/// * `horizon` - Offset of the target beyond the window
/// * `target_columns` - Column indices copied into each target
pub fn window<R: AsRef<[f64]>>(
    rows: &[R],
    lookback: usize,
    horizon: usize,
    target_columns: &[usize],
) -> Vec<SequencePair> {
    let n = rows.len();
    if lookback == 0 || n <= lookback + horizon {
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(n - lookback - horizon);
    for i in lookback..(n - horizon) {
        let input = rows[i - lookback..i]
            .iter()
            .map(|r| r.as_ref().to_vec())
            .collect();
        let target_row = rows[i + horizon].as_ref();
        let target = target_columns
            .iter()
            .filter_map(|&c| target_row.get(c).copied())
            .collect();
        pairs.push(SequencePair { input, target });
    }

    pairs
}

/// Configuration for [`SequenceWindower`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of past hours in each input window.
    pub lookback: usize,
    /// Offset of the target beyond the window.
    pub horizon: usize,
    /// Column indices used as model input.
    pub feature_columns: Vec<usize>,
    /// Column indices used as model target.
    pub target_columns: Vec<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback: 24,
            horizon: 1,
            feature_columns: (0..FEATURE_COUNT).collect(),
            target_columns: (0..PHYSICAL_COUNT).collect(),
        }
    }
}

impl WindowConfig {
    pub fn new(lookback: usize, horizon: usize) -> Self {
        Self {
            lookback,
            horizon,
            ..Default::default()
        }
    }

    pub fn with_feature_columns(mut self, columns: Vec<usize>) -> Self {
        self.feature_columns = columns;
        self
    }

    pub fn with_target_columns(mut self, columns: Vec<usize>) -> Self {
        self.target_columns = columns;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(MeteoError::InvalidParameter(
                "lookback must be positive".to_string(),
            ));
        }
        if self.feature_columns.is_empty() || self.target_columns.is_empty() {
            return Err(MeteoError::InvalidParameter(
                "feature and target columns must not be empty".to_string(),
            ));
        }
        if let Some(&c) = self
            .feature_columns
            .iter()
            .chain(&self.target_columns)
            .find(|&&c| c >= FEATURE_COUNT)
        {
            return Err(MeteoError::InvalidParameter(format!(
                "column index {c} out of range for {FEATURE_COUNT} features"
            )));
        }
        Ok(())
    }
}

/// Windower over persisted partition rows.
#[derive(Debug, Clone)]
pub struct SequenceWindower {
    config: WindowConfig,
}

impl SequenceWindower {
    pub fn new(config: WindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Number of pairs [`window`] yields for `len` rows.
    pub fn expected_pairs(&self, len: usize) -> usize {
        len.saturating_sub(self.config.lookback + self.config.horizon)
    }

    /// Window the whole partition as one contiguous sequence.
    pub fn windows(&self, rows: &[ScaledRow]) -> Vec<SequencePair> {
        let pairs = self.window_rows(rows);
        if pairs.is_empty() && !rows.is_empty() {
            tracing::warn!(
                rows = rows.len(),
                lookback = self.config.lookback,
                horizon = self.config.horizon,
                "partition too short to produce any sequence"
            );
        }
        pairs
    }

    /// Window each contiguous segment independently.
    ///
    /// A segment ends where provenance changes or where consecutive rows are
    /// not exactly one hour apart, so no window mixes real and synthetic
    /// rows or bridges a gap.
    pub fn windows_by_segment(&self, rows: &[ScaledRow]) -> Vec<SequencePair> {
        let segments = contiguous_segments(rows);
        let mut pairs = Vec::new();
        for range in &segments {
            pairs.extend(self.window_rows(&rows[range.clone()]));
        }
        tracing::debug!(
            segments = segments.len(),
            pairs = pairs.len(),
            "windowed partition by contiguous segment"
        );
        pairs
    }

    fn window_rows(&self, rows: &[ScaledRow]) -> Vec<SequencePair> {
        let WindowConfig {
            lookback,
            horizon,
            ref feature_columns,
            ref target_columns,
        } = self.config;

        let n = rows.len();
        if n <= lookback + horizon {
            return Vec::new();
        }

        (lookback..(n - horizon))
            .map(|i| SequencePair {
                input: rows[i - lookback..i]
                    .iter()
                    .map(|r| feature_columns.iter().map(|&c| r.features[c]).collect())
                    .collect(),
                target: target_columns
                    .iter()
                    .map(|&c| rows[i + horizon].features[c])
                    .collect(),
            })
            .collect()
    }
}

/// Index ranges of runs of rows that share provenance and are spaced
/// exactly one hour apart.
pub fn contiguous_segments(rows: &[ScaledRow]) -> Vec<std::ops::Range<usize>> {
    let mut segments = Vec::new();
    if rows.is_empty() {
        return segments;
    }

    let step = Duration::hours(1);
    let mut start = 0;
    for i in 1..rows.len() {
        let prev = &rows[i - 1];
        let cur = &rows[i];
        if cur.is_synthetic != prev.is_synthetic || cur.timestamp - prev.timestamp != step {
            segments.push(start..i);
            start = i;
        }
    }
    segments.push(start..rows.len());
    segments
}
