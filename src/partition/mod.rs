//! Leakage-safe chronological partitioning and normalization.
//!
//! Real rows before the evaluation year form the training history. Rows of
//! the evaluation year are split by month parity, odd months to validation
//! and even months to test, so every season is represented in both. All
//! synthetic rows go to training only. The scaler is fit on the training
//! partition and then applied unchanged to all three.

mod artifact;

pub use artifact::{ScalerArtifact, SCALER_FORMAT_VERSION};

use crate::core::{FeatureRow, ScaledRow, FEATURE_COUNT, PRECIPITATION};
use crate::data::store;
use crate::error::{MeteoError, Result};
use crate::transform::{FeatureScaler, MinMaxScaler, PrecipitationTransform};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for [`Partitioner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Year held out for evaluation; earlier real years train the model.
    pub evaluation_year: i32,
    /// Transform applied to precipitation before the scaler is fit.
    pub precipitation_transform: PrecipitationTransform,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            evaluation_year: 2024,
            precipitation_transform: PrecipitationTransform::Identity,
        }
    }
}

impl PartitionConfig {
    pub fn new(evaluation_year: i32) -> Self {
        Self {
            evaluation_year,
            ..Default::default()
        }
    }

    pub fn with_precipitation_transform(mut self, transform: PrecipitationTransform) -> Self {
        self.precipitation_transform = transform;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=9999).contains(&self.evaluation_year) {
            return Err(MeteoError::InvalidParameter(format!(
                "evaluation year {} out of range",
                self.evaluation_year
            )));
        }
        Ok(())
    }
}

/// Role of a dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    Train,
    Validation,
    Test,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [
        PartitionKind::Train,
        PartitionKind::Validation,
        PartitionKind::Test,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PartitionKind::Train => "train",
            PartitionKind::Validation => "validation",
            PartitionKind::Test => "test",
        }
    }

    /// Location of this partition's CSV under `data_dir`.
    pub fn path_in(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir
            .as_ref()
            .join(self.name())
            .join(format!("{}.csv", self.name()))
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows assigned to each partition before scaling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    pub train: Vec<FeatureRow>,
    pub validation: Vec<FeatureRow>,
    pub test: Vec<FeatureRow>,
    /// Real rows after the evaluation year, excluded from every partition.
    pub dropped: usize,
}

/// A scaled, ordered partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub kind: PartitionKind,
    pub rows: Vec<ScaledRow>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of synthetic rows in the partition.
    pub fn synthetic_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_synthetic).count()
    }

    /// Feature matrix, one row per hour.
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.features.to_vec()).collect()
    }

    pub fn save(&self, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.kind.path_in(data_dir);
        store::write_scaled_rows(&path, &self.rows)?;
        Ok(path)
    }

    pub fn load(kind: PartitionKind, data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = kind.path_in(data_dir);
        if !path.exists() {
            return Err(MeteoError::missing_artifact(
                &path,
                "run the partition step to write the dataset partitions",
            ));
        }
        let rows = store::read_scaled_rows(&path)?;
        Ok(Self { kind, rows })
    }
}

/// Output of one partition-and-normalize run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
    pub artifact: ScalerArtifact,
}

impl NormalizedDataset {
    pub fn partition(&self, kind: PartitionKind) -> &Partition {
        match kind {
            PartitionKind::Train => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test => &self.test,
        }
    }

    /// Write all partitions under `data_dir` and the scaler to `scaler_path`.
    pub fn save(&self, data_dir: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<()> {
        let data_dir = data_dir.as_ref();
        for kind in PartitionKind::ALL {
            let path = self.partition(kind).save(data_dir)?;
            tracing::debug!(partition = %kind, path = %path.display(), "wrote partition");
        }
        self.artifact.save(scaler_path)?;
        Ok(())
    }
}

/// Splits a real + synthetic corpus and normalizes it without leakage.
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    config: PartitionConfig,
}

impl Partitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Assign rows to partitions without scaling.
    ///
    /// Real rows are ordered chronologically; synthetic rows keep their
    /// generated order and follow the real training history.
    pub fn split(&self, corpus: &[FeatureRow]) -> Split {
        let year = self.config.evaluation_year;

        let mut real: Vec<FeatureRow> = corpus.iter().filter(|r| !r.is_synthetic()).copied().collect();
        real.sort_by_key(|r| r.timestamp());

        let mut split = Split::default();
        for row in real {
            let ts = row.timestamp();
            if ts.year() < year {
                split.train.push(row);
            } else if ts.year() == year {
                if ts.month() % 2 == 1 {
                    split.validation.push(row);
                } else {
                    split.test.push(row);
                }
            } else {
                split.dropped += 1;
            }
        }

        split
            .train
            .extend(corpus.iter().filter(|r| r.is_synthetic()).copied());

        if split.dropped > 0 {
            tracing::warn!(
                dropped = split.dropped,
                evaluation_year = year,
                "real rows after the evaluation year were excluded"
            );
        }

        split
    }

    /// Split, fit the scaler on the training partition, scale everything.
    ///
    /// # Errors
    /// `InsufficientData` when the training partition is empty.
    pub fn run(&self, corpus: &[FeatureRow]) -> Result<NormalizedDataset> {
        let split = self.split(corpus);

        let train_raw: Vec<[f64; FEATURE_COUNT]> =
            split.train.iter().map(|r| self.raw_features(r)).collect();
        // Only the training partition is ever passed to fit.
        let scaler = MinMaxScaler::fit(&train_raw)?;

        let train = self.scale(PartitionKind::Train, &split.train, &scaler)?;
        let validation = self.scale(PartitionKind::Validation, &split.validation, &scaler)?;
        let test = self.scale(PartitionKind::Test, &split.test, &scaler)?;

        tracing::info!(
            train = train.len(),
            train_synthetic = train.synthetic_count(),
            validation = validation.len(),
            test = test.len(),
            evaluation_year = self.config.evaluation_year,
            "partitioned and normalized dataset"
        );

        Ok(NormalizedDataset {
            train,
            validation,
            test,
            artifact: ScalerArtifact::new(scaler, self.config.precipitation_transform),
        })
    }

    /// Unscaled model input for one row.
    fn raw_features(&self, row: &FeatureRow) -> [f64; FEATURE_COUNT] {
        let mut features = row.features();
        features[PRECIPITATION] = self
            .config
            .precipitation_transform
            .forward(features[PRECIPITATION]);
        features
    }

    fn scale(
        &self,
        kind: PartitionKind,
        rows: &[FeatureRow],
        scaler: &MinMaxScaler,
    ) -> Result<Partition> {
        let rows = rows
            .iter()
            .map(|row| {
                let scaled = scaler.transform_row(&self.raw_features(row))?;
                let features: [f64; FEATURE_COUNT] =
                    scaled
                        .try_into()
                        .map_err(|v: Vec<f64>| MeteoError::DimensionMismatch {
                            expected: FEATURE_COUNT,
                            got: v.len(),
                        })?;
                Ok(ScaledRow::new(row.timestamp(), features, row.is_synthetic()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Partition { kind, rows })
    }
}
