//! Physical plausibility rules applied to every predicted hour.

use crate::core::{WeatherCondition, HUMIDITY, PHYSICAL_COUNT, PRECIPITATION, WIND_SPEED};

/// Clip a denormalized physical vector into plausible ranges, in place.
///
/// Humidity is clamped to [0, 100]. Wind speed is raised to 0 and, when
/// `wind_ceiling` is set, capped there. Precipitation is raised to 0 and then
/// zeroed when below `noise_floor`.
pub fn apply_constraints(values: &mut [f64; PHYSICAL_COUNT], noise_floor: f64, wind_ceiling: Option<f64>) {
    values[HUMIDITY] = values[HUMIDITY].clamp(0.0, 100.0);

    values[WIND_SPEED] = values[WIND_SPEED].max(0.0);
    if let Some(ceiling) = wind_ceiling {
        values[WIND_SPEED] = values[WIND_SPEED].min(ceiling);
    }

    values[PRECIPITATION] = values[PRECIPITATION].max(0.0);
    if values[PRECIPITATION] < noise_floor {
        values[PRECIPITATION] = 0.0;
    }
}

/// Snow when precipitating at or below `freeze_threshold`, rain when
/// precipitating above it, clear otherwise.
pub fn classify(temperature: f64, precipitation: f64, freeze_threshold: f64) -> WeatherCondition {
    if precipitation > 0.0 && temperature <= freeze_threshold {
        WeatherCondition::Snow
    } else if precipitation > 0.0 {
        WeatherCondition::Rain
    } else {
        WeatherCondition::Clear
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
