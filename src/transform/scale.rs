//! Min-max feature scaling.
//!
//! The scaler is fit once on the training partition and then only ever used
//! to transform or invert; it has no way to be refit in place.

use crate::error::{MeteoError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Narrow scaling interface consumed by the forecaster.
pub trait FeatureScaler {
    /// Number of columns the scaler was fit on.
    fn n_features(&self) -> usize;

    /// Scale one row of raw values.
    fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Recover raw values from one scaled row.
    fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Scale a matrix of rows.
    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Invert a matrix of scaled rows.
    fn inverse_transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.inverse_transform_row(r)).collect()
    }
}

impl<T: FeatureScaler + ?Sized> FeatureScaler for &T {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        (**self).transform_row(row)
    }

    fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        (**self).inverse_transform_row(row)
    }
}

impl<T: FeatureScaler + ?Sized> FeatureScaler for Arc<T> {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        (**self).transform_row(row)
    }

    fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        (**self).inverse_transform_row(row)
    }
}

/// Per-column min-max transform to [0, 1].
///
/// x_scaled = (x - min) / (max - min)
///
/// Columns with zero range use a scale of 1, so every value maps to 0.
/// Values outside the fitted range are not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    scale: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit per-column min and range.
    ///
    /// # Errors
    /// `InsufficientData` for no rows, `DimensionMismatch` for ragged rows,
    /// `InvalidParameter` for non-finite values.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or(MeteoError::InsufficientData { needed: 1, got: 0 })?;
        let width = first.as_ref().len();
        if width == 0 {
            return Err(MeteoError::InvalidParameter(
                "cannot fit a scaler on zero columns".to_string(),
            ));
        }

        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(MeteoError::DimensionMismatch {
                    expected: width,
                    got: row.len(),
                });
            }
            for (j, &x) in row.iter().enumerate() {
                if !x.is_finite() {
                    return Err(MeteoError::InvalidParameter(format!(
                        "non-finite value at row {i}, column {j}"
                    )));
                }
                min[j] = min[j].min(x);
                max[j] = max[j].max(x);
            }
        }

        let scale = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| {
                let range = hi - lo;
                if range < 1e-10 {
                    1.0
                } else {
                    range
                }
            })
            .collect();

        Ok(Self { min, scale })
    }

    /// Rebuild a scaler from stored parameters.
    pub fn from_parts(min: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if min.len() != scale.len() {
            return Err(MeteoError::DimensionMismatch {
                expected: min.len(),
                got: scale.len(),
            });
        }
        if scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(MeteoError::InvalidParameter(
                "scale must be finite and positive".to_string(),
            ));
        }
        Ok(Self { min, scale })
    }

    pub fn data_min(&self) -> &[f64] {
        &self.min
    }

    /// Per-column range used as divisor.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Upper bound of the fitted range per column.
    pub fn data_max(&self) -> Vec<f64> {
        self.min.iter().zip(&self.scale).map(|(m, s)| m + s).collect()
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.min.len() {
            return Err(MeteoError::DimensionMismatch {
                expected: self.min.len(),
                got: row.len(),
            });
        }
        Ok(())
    }
}

impl FeatureScaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.min.iter().zip(&self.scale))
            .map(|(&x, (&m, &s))| (x - m) / s)
            .collect())
    }

    fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.min.iter().zip(&self.scale))
            .map(|(&x, (&m, &s))| x * s + m)
            .collect())
    }
}
