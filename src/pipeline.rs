//! Offline data preparation pipeline.
//!
//! Stages run in order: acquire raw observations, augment them with
//! synthetic extremes, then partition and normalize. Each stage persists its
//! output under an [`ArtifactLayout`] and is skipped on later runs when that
//! output already exists, unless the pipeline is forced.

use crate::config::PipelineConfig;
use crate::core::FeatureRow;
use crate::data::{store, Location, WeatherSource};
use crate::error::{MeteoError, Result};
use crate::evaluation::{evaluate, EvaluationReport};
use crate::models::StepModel;
use crate::partition::{NormalizedDataset, Partition, PartitionKind, Partitioner, ScalerArtifact};
use crate::synthetic::{SyntheticGenerator, SyntheticSummary};
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

/// Where each pipeline artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    data_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join("raw").join("weather_history_raw.csv")
    }

    pub fn synthetic_path(&self) -> PathBuf {
        self.data_dir.join("generated").join("synthetic_extremes.csv")
    }

    pub fn hybrid_path(&self) -> PathBuf {
        self.data_dir.join("generated").join("hybrid_dataset.csv")
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.data_dir.join("scalers").join("minmax_scaler.json")
    }

    pub fn partition_path(&self, kind: PartitionKind) -> PathBuf {
        kind.path_in(&self.data_dir)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join("results").join("test_metrics.json")
    }
}

/// How a stage obtained its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Computed,
    Reused,
}

/// Summary of one [`Pipeline::prepare`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub acquisition: StageOutcome,
    pub augmentation: StageOutcome,
    pub partitioning: StageOutcome,
    pub real_rows: usize,
    /// Per-source counts, present when synthetic rows were generated this run.
    pub synthetic: Option<SyntheticSummary>,
    pub synthetic_rows: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
}

/// Offline pipeline over a [`WeatherSource`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    layout: ArtifactLayout,
    force: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, layout: ArtifactLayout) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            layout,
            force: false,
        })
    }

    /// Recompute every stage even when its artifacts exist.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Run acquisition, augmentation and partitioning.
    pub fn prepare<W: WeatherSource + ?Sized>(
        &self,
        source: &W,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PipelineReport> {
        let (real, acquisition) = self.acquire(source, location, start, end)?;
        let (hybrid, synthetic, augmentation) = self.augment(&real)?;
        let (dataset, partitioning) = self.partition(&hybrid)?;

        let report = PipelineReport {
            acquisition,
            augmentation,
            partitioning,
            real_rows: real.len(),
            synthetic,
            synthetic_rows: hybrid.iter().filter(|r| r.is_synthetic()).count(),
            train_rows: dataset.train.len(),
            validation_rows: dataset.validation.len(),
            test_rows: dataset.test.len(),
        };
        tracing::info!(
            real = report.real_rows,
            synthetic = report.synthetic_rows,
            train = report.train_rows,
            validation = report.validation_rows,
            test = report.test_rows,
            "pipeline prepared"
        );
        Ok(report)
    }

    /// Fetch real observations, or reuse the cached raw table.
    pub fn acquire<W: WeatherSource + ?Sized>(
        &self,
        source: &W,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<FeatureRow>, StageOutcome)> {
        let path = self.layout.raw_path();
        if !self.force && path.exists() {
            tracing::info!(path = %path.display(), "reusing raw observations");
            return Ok((store::read_feature_rows(&path)?, StageOutcome::Reused));
        }

        let observations = source.fetch(location, start, end)?;
        if observations.is_empty() {
            return Err(MeteoError::InsufficientData { needed: 1, got: 0 });
        }
        let rows: Vec<FeatureRow> = observations.into_iter().map(FeatureRow::real).collect();
        store::write_feature_rows(&path, &rows)?;
        Ok((rows, StageOutcome::Computed))
    }

    /// Build the hybrid real + synthetic table, or reuse the cached one.
    pub fn augment(
        &self,
        real: &[FeatureRow],
    ) -> Result<(Vec<FeatureRow>, Option<SyntheticSummary>, StageOutcome)> {
        let path = self.layout.hybrid_path();
        if !self.force && path.exists() {
            tracing::info!(path = %path.display(), "reusing hybrid dataset");
            return Ok((store::read_feature_rows(&path)?, None, StageOutcome::Reused));
        }

        // Noise is resampled from training history only.
        let evaluation_year = self.config.partition.evaluation_year;
        let history: Vec<FeatureRow> = real
            .iter()
            .filter(|r| r.timestamp().year() < evaluation_year)
            .copied()
            .collect();
        tracing::debug!(
            history = history.len(),
            held_out = real.len() - history.len(),
            "noise source restricted to rows before the evaluation year"
        );

        let mut generator = SyntheticGenerator::new(self.config.synthetic.clone())?;
        let (synthetic, summary) = generator.generate_with_summary(&history);
        store::write_feature_rows(self.layout.synthetic_path(), &synthetic)?;

        let mut hybrid = Vec::with_capacity(real.len() + synthetic.len());
        hybrid.extend_from_slice(real);
        hybrid.extend(synthetic);
        store::write_feature_rows(&path, &hybrid)?;
        Ok((hybrid, Some(summary), StageOutcome::Computed))
    }

    /// Split and normalize, or reuse persisted partitions and scaler.
    pub fn partition(&self, hybrid: &[FeatureRow]) -> Result<(NormalizedDataset, StageOutcome)> {
        let scaler_path = self.layout.scaler_path();
        let train_path = self.layout.partition_path(PartitionKind::Train);
        if !self.force && scaler_path.exists() && train_path.exists() {
            tracing::info!(path = %scaler_path.display(), "reusing normalized partitions");
            return Ok((self.load_dataset()?, StageOutcome::Reused));
        }

        let dataset = Partitioner::new(self.config.partition.clone()).run(hybrid)?;
        dataset.save(self.layout.data_dir(), &scaler_path)?;
        Ok((dataset, StageOutcome::Computed))
    }

    /// Load the persisted scaler and check it against the forecast config.
    pub fn load_scaler(&self) -> Result<ScalerArtifact> {
        let artifact = ScalerArtifact::load(self.layout.scaler_path())?;
        if artifact.precipitation_transform != self.config.forecast.precipitation_transform {
            return Err(MeteoError::InvalidParameter(
                "scaler was fit with a different precipitation transform".to_string(),
            ));
        }
        Ok(artifact)
    }

    /// Load all persisted partitions with their scaler.
    pub fn load_dataset(&self) -> Result<NormalizedDataset> {
        let data_dir = self.layout.data_dir();
        Ok(NormalizedDataset {
            train: Partition::load(PartitionKind::Train, data_dir)?,
            validation: Partition::load(PartitionKind::Validation, data_dir)?,
            test: Partition::load(PartitionKind::Test, data_dir)?,
            artifact: ScalerArtifact::load(self.layout.scaler_path())?,
        })
    }

    /// Score `model` on the persisted test partition and write the metrics.
    pub fn evaluate<M: StepModel + ?Sized>(&self, model: &M) -> Result<EvaluationReport> {
        let artifact = self.load_scaler()?;
        let test = Partition::load(PartitionKind::Test, self.layout.data_dir())?;
        let report = evaluate(
            model,
            artifact.scaler(),
            &test.rows,
            &self.config.window,
            &self.config.forecast,
        )?;
        report.save(self.layout.metrics_path())?;
        Ok(report)
    }
}
