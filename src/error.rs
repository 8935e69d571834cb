//! Error types for the meteo-forecast library.

use thiserror::Error;

/// Result type alias for pipeline and forecast operations.
pub type Result<T> = std::result::Result<T, MeteoError>;

/// Errors that can occur while preparing data or producing a forecast.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeteoError {
    /// A required upstream file is absent.
    #[error("missing artifact {path}: {hint}")]
    MissingArtifact { path: String, hint: String },

    /// Columns in a table do not match the expected schema.
    #[error("schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Not enough rows to produce any meaningful result.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The external model failed while predicting a step.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(String),

    /// A value in an input table could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Artifact (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MeteoError {
    /// Shorthand for a missing file together with the step that produces it.
    pub fn missing_artifact(path: impl AsRef<std::path::Path>, hint: impl Into<String>) -> Self {
        MeteoError::MissingArtifact {
            path: path.as_ref().display().to_string(),
            hint: hint.into(),
        }
    }
}

impl From<std::io::Error> for MeteoError {
    fn from(err: std::io::Error) -> Self {
        MeteoError::Io(err.to_string())
    }
}

impl From<csv::Error> for MeteoError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io) => MeteoError::Io(io.to_string()),
            _ => MeteoError::Parse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for MeteoError {
    fn from(err: serde_json::Error) -> Self {
        MeteoError::Serialization(err.to_string())
    }
}
