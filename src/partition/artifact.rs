//! Persisted scaler artifact.
//!
//! The artifact must travel with the model it was fit for: swapping one
//! without the other silently changes what every scaled value means.

use crate::core::FEATURE_COLUMNS;
use crate::error::{MeteoError, Result};
use crate::transform::{FeatureScaler, MinMaxScaler, PrecipitationTransform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current on-disk format version.
pub const SCALER_FORMAT_VERSION: u32 = 1;

/// A fitted scaler plus everything needed to reproduce its input space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub precipitation_transform: PrecipitationTransform,
    pub scaler: MinMaxScaler,
}

impl ScalerArtifact {
    pub fn new(scaler: MinMaxScaler, precipitation_transform: PrecipitationTransform) -> Self {
        Self {
            format_version: SCALER_FORMAT_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            precipitation_transform,
            scaler,
        }
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Check version and schema against this build.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SCALER_FORMAT_VERSION {
            return Err(MeteoError::Serialization(format!(
                "unsupported scaler format version {} (expected {})",
                self.format_version, SCALER_FORMAT_VERSION
            )));
        }

        let missing: Vec<String> = FEATURE_COLUMNS
            .iter()
            .filter(|c| !self.feature_names.iter().any(|n| n == *c))
            .map(|c| c.to_string())
            .collect();
        let unexpected: Vec<String> = self
            .feature_names
            .iter()
            .filter(|n| !FEATURE_COLUMNS.contains(&n.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(MeteoError::SchemaMismatch {
                missing,
                unexpected,
            });
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(MeteoError::InvalidParameter(
                "scaler feature order differs from model feature order".to_string(),
            ));
        }
        if self.scaler.n_features() != FEATURE_COLUMNS.len() {
            return Err(MeteoError::DimensionMismatch {
                expected: FEATURE_COLUMNS.len(),
                got: self.scaler.n_features(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a persisted artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MeteoError::missing_artifact(
                path,
                "run the partition step to fit and persist the scaler",
            ));
        }
        let contents = fs::read_to_string(path)?;
        let artifact: ScalerArtifact = serde_json::from_str(&contents)?;
        artifact.validate()?;
        Ok(artifact)
    }
}
