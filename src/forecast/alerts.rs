//! Extreme-event alerts over a finished forecast.
//!
//! Alerts come in three groups (heat, wind, precipitation). Within a group
//! only the most severe matching alert is reported.

use crate::core::ForecastTable;
use crate::error::{MeteoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert thresholds. All comparisons are strict except the freeze check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// °C above which a heat warning is raised.
    pub heat: f64,
    /// °C above which the heat warning becomes critical.
    pub extreme_heat: f64,
    /// m/s above which a wind warning is raised.
    pub strong_wind: f64,
    /// m/s above which the wind warning becomes critical.
    pub violent_storm: f64,
    /// mm/h above which torrential rain is reported.
    pub torrential_rain: f64,
    /// °C at or below which any precipitation counts as frost or snow risk.
    pub freeze_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            heat: 35.0,
            extreme_heat: 38.0,
            strong_wind: 15.0,
            violent_storm: 20.0,
            torrential_rain: 10.0,
            freeze_threshold: 0.5,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.heat,
            self.extreme_heat,
            self.strong_wind,
            self.violent_storm,
            self.torrential_rain,
            self.freeze_threshold,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(MeteoError::InvalidParameter(
                "alert thresholds must be finite".to_string(),
            ));
        }
        if self.heat > self.extreme_heat {
            return Err(MeteoError::InvalidParameter(format!(
                "heat threshold {} above extreme heat threshold {}",
                self.heat, self.extreme_heat
            )));
        }
        if self.strong_wind > self.violent_storm {
            return Err(MeteoError::InvalidParameter(format!(
                "strong wind threshold {} above violent storm threshold {}",
                self.strong_wind, self.violent_storm
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ExtremeHeat,
    Heat,
    ViolentStorm,
    StrongWind,
    TorrentialRain,
    FrostOrSnow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertKind {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertKind::ExtremeHeat | AlertKind::ViolentStorm => AlertSeverity::Critical,
            _ => AlertSeverity::Warning,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::ExtremeHeat => "extreme heat",
            AlertKind::Heat => "heat warning",
            AlertKind::ViolentStorm => "violent storm",
            AlertKind::StrongWind => "strong wind",
            AlertKind::TorrentialRain => "torrential rain",
            AlertKind::FrostOrSnow => "frost or snow risk",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A triggered alert with the value that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub value: f64,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, value: f64, message: String) -> Self {
        Self { kind, value, message }
    }

    pub fn severity(&self) -> AlertSeverity {
        self.kind.severity()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Scan a forecast for extreme conditions.
///
/// Returns at most one alert per group, in the order heat, wind,
/// precipitation. An empty table yields no alerts.
pub fn analyze(table: &ForecastTable, config: &AlertConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(max_temp) = table.max_temperature() {
        if max_temp > config.extreme_heat {
            alerts.push(Alert::new(
                AlertKind::ExtremeHeat,
                max_temp,
                format!("temperature will reach {max_temp} °C"),
            ));
        } else if max_temp > config.heat {
            alerts.push(Alert::new(AlertKind::Heat, max_temp, format!("max {max_temp} °C")));
        }
    }

    if let Some(max_wind) = table.max_wind_speed() {
        if max_wind > config.violent_storm {
            alerts.push(Alert::new(
                AlertKind::ViolentStorm,
                max_wind,
                format!("wind {max_wind} m/s"),
            ));
        } else if max_wind > config.strong_wind {
            alerts.push(Alert::new(
                AlertKind::StrongWind,
                max_wind,
                format!("gusts of {max_wind} m/s"),
            ));
        }
    }

    if let Some(max_rain) = table.max_precipitation() {
        let min_temp = table.min_temperature().unwrap_or(f64::INFINITY);
        if max_rain > config.torrential_rain {
            alerts.push(Alert::new(
                AlertKind::TorrentialRain,
                max_rain,
                format!("accumulations of {max_rain} mm/h"),
            ));
        } else if max_rain > 0.0 && min_temp <= config.freeze_threshold {
            alerts.push(Alert::new(
                AlertKind::FrostOrSnow,
                min_temp,
                "icy roads or snowfall possible".to_string(),
            ));
        }
    }

    if !alerts.is_empty() {
        tracing::info!(count = alerts.len(), "forecast alerts raised");
    }
    alerts
}
