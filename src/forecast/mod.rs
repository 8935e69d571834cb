//! Autoregressive multi-hour forecasting.
//!
//! A one-step [`StepModel`] is rolled forward: each prediction is denormalized,
//! constrained to physically plausible values, recorded, then re-encoded and
//! fed back as the newest row of the input window.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use meteo_forecast::forecast::{AutoregressiveForecaster, ForecastConfig};
//! use meteo_forecast::models::baseline::Persistence;
//! use meteo_forecast::transform::MinMaxScaler;
//!
//! let scaler = MinMaxScaler::from_parts(vec![0.0; 9], vec![1.0; 9]).unwrap();
//! let config = ForecastConfig::default().with_steps(6).with_lookback(3);
//! let forecaster = AutoregressiveForecaster::new(Persistence::new(), scaler, config).unwrap();
//!
//! let seed = vec![vec![10.0, 60.0, 1000.0, 2.0, 0.0, 0.0, 1.0, 0.0, 1.0]; 3];
//! let last = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
//! let table = forecaster.forecast(&seed, last).unwrap();
//! assert_eq!(table.len(), 6);
//! ```

pub mod alerts;
pub mod constraints;

pub use alerts::{analyze, Alert, AlertConfig, AlertKind, AlertSeverity};
pub use constraints::{apply_constraints, classify, round_to};

use crate::core::{
    FeatureRow, ForecastRecord, ForecastTable, Observation, FEATURE_COUNT, HUMIDITY, PHYSICAL_COUNT,
    PRECIPITATION, PRESSURE, TEMPERATURE, WIND_SPEED,
};
use crate::error::{MeteoError, Result};
use crate::models::StepModel;
use crate::transform::time_encoding::encode;
use crate::transform::{FeatureScaler, PrecipitationTransform};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Configuration of the rolling forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of hours to predict.
    pub steps: usize,
    /// Rows in the model input window.
    pub lookback: usize,
    /// Lower bound applied to scaled model outputs.
    pub clamp_min: f64,
    /// Upper bound applied to scaled model outputs.
    pub clamp_max: f64,
    /// °C at or below which precipitation is classified as snow.
    pub freeze_threshold: f64,
    /// Precipitation below this many mm is treated as zero.
    pub noise_floor: f64,
    /// Optional cap on predicted wind speed in m/s.
    pub wind_ceiling: Option<f64>,
    /// Must match the transform the scaler was fit with.
    pub precipitation_transform: PrecipitationTransform,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            steps: 24,
            lookback: 24,
            clamp_min: -0.5,
            clamp_max: 1.5,
            freeze_threshold: 0.5,
            noise_floor: 0.1,
            wind_ceiling: None,
            precipitation_transform: PrecipitationTransform::Identity,
        }
    }
}

impl ForecastConfig {
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_noise_floor(mut self, noise_floor: f64) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    pub fn with_wind_ceiling(mut self, ceiling: f64) -> Self {
        self.wind_ceiling = Some(ceiling);
        self
    }

    pub fn with_precipitation_transform(mut self, transform: PrecipitationTransform) -> Self {
        self.precipitation_transform = transform;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(MeteoError::InvalidParameter(
                "forecast steps must be at least 1".to_string(),
            ));
        }
        if self.lookback == 0 {
            return Err(MeteoError::InvalidParameter(
                "lookback must be at least 1".to_string(),
            ));
        }
        if !self.clamp_min.is_finite() || !self.clamp_max.is_finite() || self.clamp_min > self.clamp_max {
            return Err(MeteoError::InvalidParameter(format!(
                "invalid clamp range [{}, {}]",
                self.clamp_min, self.clamp_max
            )));
        }
        if !self.noise_floor.is_finite() || self.noise_floor < 0.0 {
            return Err(MeteoError::InvalidParameter(format!(
                "noise floor must be non-negative, got {}",
                self.noise_floor
            )));
        }
        if !self.freeze_threshold.is_finite() {
            return Err(MeteoError::InvalidParameter(
                "freeze threshold must be finite".to_string(),
            ));
        }
        if let Some(ceiling) = self.wind_ceiling {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(MeteoError::InvalidParameter(format!(
                    "wind ceiling must be non-negative, got {ceiling}"
                )));
            }
        }
        Ok(())
    }
}

/// Map scaled model outputs to constrained physical units.
///
/// Outputs are clamped to the configured range, padded with zeros to the
/// scaler width, inverse-transformed, and then passed through
/// [`apply_constraints`].
pub fn denormalize_output<S: FeatureScaler + ?Sized>(
    scaler: &S,
    scaled: &[f64],
    config: &ForecastConfig,
) -> Result<[f64; PHYSICAL_COUNT]> {
    if scaled.len() < PHYSICAL_COUNT {
        return Err(MeteoError::DimensionMismatch {
            expected: PHYSICAL_COUNT,
            got: scaled.len(),
        });
    }
    let mut padded = vec![0.0; scaler.n_features()];
    for (dst, &v) in padded.iter_mut().zip(&scaled[..PHYSICAL_COUNT]) {
        *dst = v.clamp(config.clamp_min, config.clamp_max);
    }
    let restored = scaler.inverse_transform_row(&padded)?;

    let mut physical = [0.0; PHYSICAL_COUNT];
    physical.copy_from_slice(&restored[..PHYSICAL_COUNT]);
    physical[PRECIPITATION] = config.precipitation_transform.inverse(physical[PRECIPITATION]);

    apply_constraints(&mut physical, config.noise_floor, config.wind_ceiling);
    Ok(physical)
}

/// Rolls a one-step model forward over a fixed number of hours.
#[derive(Debug, Clone)]
pub struct AutoregressiveForecaster<M, S> {
    model: M,
    scaler: S,
    config: ForecastConfig,
}

impl<M: StepModel, S: FeatureScaler> AutoregressiveForecaster<M, S> {
    /// The scaler must cover the full feature vector.
    pub fn new(model: M, scaler: S, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        if scaler.n_features() != FEATURE_COUNT {
            return Err(MeteoError::DimensionMismatch {
                expected: FEATURE_COUNT,
                got: scaler.n_features(),
            });
        }
        Ok(Self {
            model,
            scaler,
            config,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn scaler(&self) -> &S {
        &self.scaler
    }

    /// Predict `steps` hours following `last_timestamp`.
    ///
    /// `seed_window` holds the `lookback` most recent scaled feature rows,
    /// oldest first, the last one observed at `last_timestamp`. A model
    /// failure at any step aborts the whole forecast.
    pub fn forecast(&self, seed_window: &[Vec<f64>], last_timestamp: DateTime<Utc>) -> Result<ForecastTable> {
        if seed_window.len() != self.config.lookback {
            return Err(MeteoError::DimensionMismatch {
                expected: self.config.lookback,
                got: seed_window.len(),
            });
        }
        let width = self.scaler.n_features();
        if let Some(row) = seed_window.iter().find(|r| r.len() != width) {
            return Err(MeteoError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }

        let mut window: VecDeque<Vec<f64>> = seed_window.iter().cloned().collect();
        let mut table = ForecastTable::with_capacity(self.config.steps);

        for step in 0..self.config.steps {
            let output = self
                .model
                .predict(window.make_contiguous())
                .map_err(|e| MeteoError::ModelInvocation(format!("step {step}: {e}")))?;
            if output.len() < PHYSICAL_COUNT {
                return Err(MeteoError::DimensionMismatch {
                    expected: PHYSICAL_COUNT,
                    got: output.len(),
                });
            }
            if output[..PHYSICAL_COUNT].iter().any(|v| !v.is_finite()) {
                return Err(MeteoError::ModelInvocation(format!(
                    "step {step}: model returned non-finite output"
                )));
            }

            let physical = self.denormalize(&output[..PHYSICAL_COUNT])?;
            let timestamp = last_timestamp + Duration::hours(step as i64 + 1);
            let record = self.record(timestamp, &physical);

            tracing::debug!(
                step,
                %timestamp,
                temperature = record.temperature,
                humidity = record.humidity,
                pressure = record.pressure,
                wind_speed = record.wind_speed,
                precipitation = record.precipitation,
                condition = %record.condition,
                "forecast step"
            );
            table.push(record);

            let feedback = self.feedback_row(timestamp, physical)?;
            window.pop_front();
            window.push_back(feedback);
        }

        Ok(table)
    }

    /// Forecast from unscaled history, using its last `lookback` hours as seed.
    pub fn forecast_from_history(&self, history: &[Observation]) -> Result<ForecastTable> {
        let lookback = self.config.lookback;
        if history.len() < lookback {
            return Err(MeteoError::InsufficientData {
                needed: lookback,
                got: history.len(),
            });
        }
        let recent = &history[history.len() - lookback..];
        let seed = recent
            .iter()
            .map(|obs| {
                let mut row = FeatureRow::real(*obs).features();
                row[PRECIPITATION] = self.config.precipitation_transform.forward(row[PRECIPITATION]);
                self.scaler.transform_row(&row)
            })
            .collect::<Result<Vec<_>>>()?;
        let last = recent[lookback - 1].timestamp;
        self.forecast(&seed, last)
    }

    fn denormalize(&self, scaled: &[f64]) -> Result<[f64; PHYSICAL_COUNT]> {
        denormalize_output(&self.scaler, scaled, &self.config)
    }

    /// The condition is derived from the rounded values it is reported with.
    fn record(&self, timestamp: DateTime<Utc>, physical: &[f64; PHYSICAL_COUNT]) -> ForecastRecord {
        let temperature = round_to(physical[TEMPERATURE], 1);
        let precipitation = round_to(physical[PRECIPITATION], 2);
        ForecastRecord {
            timestamp,
            temperature,
            humidity: round_to(physical[HUMIDITY], 1),
            pressure: round_to(physical[PRESSURE], 1),
            wind_speed: round_to(physical[WIND_SPEED], 1),
            precipitation,
            condition: classify(temperature, precipitation, self.config.freeze_threshold),
        }
    }

    /// Re-encode a constrained, unrounded hour as a scaled input row.
    fn feedback_row(&self, timestamp: DateTime<Utc>, mut physical: [f64; PHYSICAL_COUNT]) -> Result<Vec<f64>> {
        physical[PRECIPITATION] = self.config.precipitation_transform.forward(physical[PRECIPITATION]);
        let mut row = Vec::with_capacity(FEATURE_COUNT);
        row.extend_from_slice(&physical);
        row.extend_from_slice(&encode(timestamp).to_array());
        self.scaler.transform_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WeatherCondition;
    use crate::models::baseline::Persistence;
    use crate::models::FnModel;
    use crate::transform::MinMaxScaler;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn scaler() -> MinMaxScaler {
        // temperature -20..40, humidity 0..100, pressure 950..1050, wind 0..30, precip 0..20
        MinMaxScaler::from_parts(
            vec![-20.0, 0.0, 950.0, 0.0, 0.0, -1.0, -1.0, -1.0, -1.0],
            vec![60.0, 100.0, 100.0, 30.0, 20.0, 2.0, 2.0, 2.0, 2.0],
        )
        .unwrap()
    }

    fn last() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap()
    }

    fn seed(n: usize) -> Vec<Vec<f64>> {
        vec![vec![0.5; FEATURE_COUNT]; n]
    }

    fn constant(values: Vec<f64>) -> impl StepModel {
        FnModel::new("constant", move |_w: &[Vec<f64>]| Ok(values.clone()))
    }

    #[test]
    fn produces_hourly_records() {
        let f = AutoregressiveForecaster::new(Persistence::new(), scaler(), ForecastConfig::default()).unwrap();
        let table = f.forecast(&seed(24), last()).unwrap();
        assert_eq!(table.len(), 24);
        for (i, record) in table.iter().enumerate() {
            assert_eq!(record.timestamp, last() + Duration::hours(i as i64 + 1));
        }
    }

    #[test]
    fn outputs_are_clamped_before_inverse() {
        // Scaled temperature 3.0 clamps to 1.5: -20 + 1.5 * 60 = 70.
        let model = constant(vec![3.0, 0.5, 0.5, 0.1, 0.0]);
        let f = AutoregressiveForecaster::new(model, scaler(), ForecastConfig::default().with_steps(1)).unwrap();
        let table = f.forecast(&seed(24), last()).unwrap();
        assert_relative_eq!(table.records()[0].temperature, 70.0);
    }

    #[test]
    fn humidity_and_wind_are_constrained() {
        let model = constant(vec![0.5, 1.4, 0.5, -0.4, 0.0]);
        let config = ForecastConfig::default().with_steps(3);
        let f = AutoregressiveForecaster::new(model, scaler(), config).unwrap();
        for record in &f.forecast(&seed(24), last()).unwrap() {
            assert_eq!(record.humidity, 100.0);
            assert_eq!(record.wind_speed, 0.0);
        }
    }

    #[test]
    fn wind_ceiling_caps_speed() {
        let model = constant(vec![0.5, 0.5, 0.5, 0.9, 0.0]);
        let config = ForecastConfig::default().with_steps(2).with_wind_ceiling(8.0);
        let f = AutoregressiveForecaster::new(model, scaler(), config).unwrap();
        let table = f.forecast(&seed(24), last()).unwrap();
        assert_eq!(table.max_wind_speed(), Some(8.0));
    }

    #[test]
    fn precipitation_condition() {
        // 0.5 mm at 0.5 scaled temperature (10 °C) is rain.
        let model = constant(vec![0.5, 0.5, 0.5, 0.1, 0.025]);
        let f = AutoregressiveForecaster::new(model, scaler(), ForecastConfig::default().with_steps(1)).unwrap();
        let record = f.forecast(&seed(24), last()).unwrap().records()[0];
        assert_relative_eq!(record.precipitation, 0.5);
        assert_eq!(record.condition, WeatherCondition::Rain);

        // Same precipitation at -20 °C is snow.
        let model = constant(vec![0.0, 0.5, 0.5, 0.1, 0.025]);
        let f = AutoregressiveForecaster::new(model, scaler(), ForecastConfig::default().with_steps(1)).unwrap();
        let record = f.forecast(&seed(24), last()).unwrap().records()[0];
        assert_eq!(record.condition, WeatherCondition::Snow);
    }

    #[test]
    fn condition_agrees_with_rounded_precipitation() {
        // 0.004 mm survives a zero noise floor but rounds to 0.00.
        let model = constant(vec![0.5, 0.5, 0.5, 0.1, 0.0002]);
        let config = ForecastConfig::default().with_steps(3).with_noise_floor(0.0);
        let f = AutoregressiveForecaster::new(model, scaler(), config).unwrap();
        for record in &f.forecast(&seed(24), last()).unwrap() {
            assert_eq!(record.precipitation, 0.0);
            assert_eq!(record.condition, WeatherCondition::Clear);
        }
    }

    #[test]
    fn log1p_is_inverted() {
        // Scaled 0.1 on a 0..20 log range is ln(1 + p) = 2, p = e^2 - 1.
        let model = constant(vec![0.5, 0.5, 0.5, 0.1, 0.1]);
        let config = ForecastConfig::default()
            .with_steps(1)
            .with_precipitation_transform(PrecipitationTransform::Log1p);
        let f = AutoregressiveForecaster::new(model, scaler(), config).unwrap();
        let record = f.forecast(&seed(24), last()).unwrap().records()[0];
        assert_relative_eq!(record.precipitation, round_to(2f64.exp_m1(), 2));
    }

    #[test]
    fn feedback_enters_window() {
        let seen = RefCell::new(Vec::new());
        let model = FnModel::new("recorder", |w: &[Vec<f64>]| {
            seen.borrow_mut().push(w.to_vec());
            Ok(vec![0.25, 0.5, 0.5, 0.1, 0.0])
        });
        let config = ForecastConfig::default().with_steps(3).with_lookback(4);
        let f = AutoregressiveForecaster::new(&model, scaler(), config).unwrap();
        f.forecast(&seed(4), last()).unwrap();

        let windows = seen.borrow();
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.len() == 4));
        // Newest row after step 0 is the feedback of the first prediction.
        let fed = &windows[1][3];
        assert_relative_eq!(fed[TEMPERATURE], 0.25, epsilon = 1e-12);
        let time = encode(last() + Duration::hours(1)).to_array();
        assert_relative_eq!(fed[5], (time[0] + 1.0) / 2.0, epsilon = 1e-12);
        // The oldest seed row was dropped.
        assert_eq!(windows[1][0], vec![0.5; FEATURE_COUNT]);
        assert_eq!(windows[2][2], windows[1][3]);
    }

    #[test]
    fn feedback_uses_unrounded_values() {
        let seen = RefCell::new(Vec::new());
        let model = FnModel::new("recorder", |w: &[Vec<f64>]| {
            seen.borrow_mut().push(w.to_vec());
            Ok(vec![0.50123, 0.5, 0.5, 0.1, 0.0])
        });
        let config = ForecastConfig::default().with_steps(2).with_lookback(2);
        let f = AutoregressiveForecaster::new(&model, scaler(), config).unwrap();
        let table = f.forecast(&seed(2), last()).unwrap();

        assert_relative_eq!(table.records()[0].temperature, 10.1);
        let fed = &seen.borrow()[1][1];
        assert_relative_eq!(fed[TEMPERATURE], 0.50123, epsilon = 1e-9);
    }

    #[test]
    fn model_failure_is_fatal() {
        let model = FnModel::new("flaky", |_w: &[Vec<f64>]| {
            Err(MeteoError::InvalidParameter("bad input".to_string()))
        });
        let f = AutoregressiveForecaster::new(model, scaler(), ForecastConfig::default()).unwrap();
        assert!(matches!(
            f.forecast(&seed(24), last()),
            Err(MeteoError::ModelInvocation(_))
        ));
    }

    #[test]
    fn short_output_is_dimension_mismatch() {
        let f = AutoregressiveForecaster::new(constant(vec![0.5; 3]), scaler(), ForecastConfig::default()).unwrap();
        assert!(matches!(
            f.forecast(&seed(24), last()),
            Err(MeteoError::DimensionMismatch { expected: 5, got: 3 })
        ));
    }

    #[test]
    fn non_finite_output_is_rejected() {
        let model = constant(vec![f64::NAN, 0.5, 0.5, 0.5, 0.0]);
        let f = AutoregressiveForecaster::new(model, scaler(), ForecastConfig::default()).unwrap();
        assert!(matches!(
            f.forecast(&seed(24), last()),
            Err(MeteoError::ModelInvocation(_))
        ));
    }

    #[test]
    fn seed_shape_is_checked() {
        let f = AutoregressiveForecaster::new(Persistence::new(), scaler(), ForecastConfig::default()).unwrap();
        assert!(matches!(
            f.forecast(&seed(23), last()),
            Err(MeteoError::DimensionMismatch { expected: 24, got: 23 })
        ));
        let narrow = vec![vec![0.5; 5]; 24];
        assert!(matches!(
            f.forecast(&narrow, last()),
            Err(MeteoError::DimensionMismatch { expected: 9, got: 5 })
        ));
    }

    #[test]
    fn scaler_width_is_checked() {
        let narrow = MinMaxScaler::from_parts(vec![0.0; 5], vec![1.0; 5]).unwrap();
        assert!(AutoregressiveForecaster::new(Persistence::new(), narrow, ForecastConfig::default()).is_err());
    }

    #[test]
    fn from_history() {
        let base = last() - Duration::hours(30);
        let history: Vec<Observation> = (0..30)
            .map(|i| Observation::new(base + Duration::hours(i), 12.0, 70.0, 1012.0, 4.0, 0.0))
            .collect();
        let f = AutoregressiveForecaster::new(Persistence::new(), scaler(), ForecastConfig::default().with_steps(4)).unwrap();
        let table = f.forecast_from_history(&history).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.records()[0].timestamp, history[29].timestamp + Duration::hours(1));
        assert_relative_eq!(table.records()[3].temperature, 12.0);

        assert!(matches!(
            f.forecast_from_history(&history[..10]),
            Err(MeteoError::InsufficientData { needed: 24, got: 10 })
        ));
    }

    #[test]
    fn config_validation() {
        assert!(ForecastConfig::default().validate().is_ok());
        let inverted = ForecastConfig {
            clamp_min: 2.0,
            clamp_max: 1.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        assert!(ForecastConfig::default().with_noise_floor(-0.1).validate().is_err());
        assert!(ForecastConfig::default().with_lookback(0).validate().is_err());
    }
}
