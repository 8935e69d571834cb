//! Pipeline-wide configuration.
//!
//! Every stage takes its own config struct; [`PipelineConfig`] bundles them so
//! a whole run can be described by one JSON file. Missing sections fall back
//! to their defaults.
//!
//! ```
//! use meteo_forecast::config::PipelineConfig;
//!
//! let config: PipelineConfig = serde_json::from_str(r#"{ "window": { "lookback": 48 } }"#).unwrap();
//! assert_eq!(config.window.lookback, 48);
//! assert_eq!(config.window.horizon, 1);
//! ```

use crate::error::{MeteoError, Result};
use crate::forecast::{AlertConfig, ForecastConfig};
use crate::partition::PartitionConfig;
use crate::synthetic::SyntheticConfig;
use crate::transform::WindowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration of every stage of an offline + online run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub synthetic: SyntheticConfig,
    pub partition: PartitionConfig,
    pub forecast: ForecastConfig,
    pub alerts: AlertConfig,
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MeteoError::missing_artifact(
                path,
                "write a pipeline config or use the defaults",
            ));
        }
        let text = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate each section and the agreements between them.
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.synthetic.validate()?;
        self.partition.validate()?;
        self.forecast.validate()?;
        self.alerts.validate()?;

        if self.window.lookback != self.forecast.lookback {
            return Err(MeteoError::InvalidParameter(format!(
                "window lookback {} differs from forecast lookback {}",
                self.window.lookback, self.forecast.lookback
            )));
        }
        if self.partition.precipitation_transform != self.forecast.precipitation_transform {
            return Err(MeteoError::InvalidParameter(
                "partition and forecast use different precipitation transforms".to_string(),
            ));
        }
        // Scenario rows always land in train, so they must predate the held-out year.
        if self.synthetic.reference_year >= self.partition.evaluation_year {
            return Err(MeteoError::InvalidParameter(format!(
                "synthetic reference year {} must precede evaluation year {}",
                self.synthetic.reference_year, self.partition.evaluation_year
            )));
        }
        Ok(())
    }
}
