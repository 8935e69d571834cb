//! # meteo-forecast
//!
//! Hourly weather data preparation and autoregressive forecasting.
//!
//! Prepares hourly meteorological series for a one-step regression model
//! (cyclical time encoding, synthetic extreme-event injection, leakage-safe
//! partitioning and min-max normalization, sequence windowing) and rolls a
//! trained model forward into a physically constrained multi-hour forecast.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod forecast;
pub mod models;
pub mod partition;
pub mod pipeline;
pub mod synthetic;
pub mod transform;

pub use error::{MeteoError, Result};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{FeatureRow, ForecastRecord, ForecastTable, Observation, ScaledRow, WeatherCondition};
    pub use crate::error::{MeteoError, Result};
    pub use crate::forecast::{AutoregressiveForecaster, ForecastConfig};
    pub use crate::models::StepModel;
    pub use crate::transform::{FeatureScaler, MinMaxScaler};
}
