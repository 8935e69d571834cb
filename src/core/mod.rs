//! Core data structures for hourly weather data and forecasts.

mod forecast;
mod observation;

pub use forecast::{ForecastRecord, ForecastTable, WeatherCondition};
pub use observation::{
    FeatureRow, Observation, ScaledRow, FEATURE_COLUMNS, FEATURE_COUNT, HUMIDITY,
    PHYSICAL_COLUMNS, PHYSICAL_COUNT, PRECIPITATION, PRESSURE, TEMPERATURE, TIME_COLUMNS,
    WIND_SPEED,
};
