//! End-to-end tests over the public API.
//!
//! Covers chronological partitioning, forecasting with stub models, synthetic
//! generation, on-disk reproducibility and a full pipeline run from a cached
//! archive export.

use approx::assert_relative_eq;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use meteo_forecast::config::PipelineConfig;
use meteo_forecast::core::{FeatureRow, Observation, WeatherCondition, FEATURE_COUNT, PHYSICAL_COUNT};
use meteo_forecast::data::{CsvArchiveSource, Location};
use meteo_forecast::forecast::{analyze, AlertKind, AutoregressiveForecaster, ForecastConfig};
use meteo_forecast::models::baseline::Persistence;
use meteo_forecast::models::{FnModel, StepModel};
use meteo_forecast::partition::{PartitionConfig, PartitionKind, Partitioner, ScalerArtifact};
use meteo_forecast::pipeline::{ArtifactLayout, Pipeline, StageOutcome};
use meteo_forecast::synthetic::{SyntheticConfig, SyntheticGenerator};
use meteo_forecast::transform::{encode, FeatureScaler, MinMaxScaler, SequenceWindower, WindowConfig};
use meteo_forecast::MeteoError;
use std::fs;
use std::path::Path;

fn hourly(start: DateTime<Utc>, hours: usize) -> Vec<FeatureRow> {
    (0..hours)
        .map(|i| {
            let t = i as f64;
            FeatureRow::real(Observation::new(
                start + Duration::hours(i as i64),
                12.0 + 8.0 * (t * std::f64::consts::TAU / 24.0).sin(),
                65.0 + 20.0 * (t / 50.0).cos(),
                1005.0 + (t % 17.0),
                2.0 + (t % 9.0),
                if i % 11 == 0 { 1.2 } else { 0.0 },
            ))
        })
        .collect()
}

/// 2020-2023 history plus the whole of 2024, sampled every 6 hours.
fn multi_year_corpus() -> Vec<FeatureRow> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut rows = Vec::new();
    let mut ts = start;
    let mut i = 0;
    while ts < end {
        rows.push(FeatureRow::real(Observation::new(
            ts,
            10.0 + (i % 30) as f64,
            40.0 + (i % 50) as f64,
            990.0 + (i % 40) as f64,
            (i % 12) as f64,
            (i % 5) as f64 * 0.3,
        )));
        ts += Duration::hours(6);
        i += 1;
    }
    rows
}

/// Scenario counts are scaled down so noise fills the rest of `target`.
fn small_synthetic(seed: u64, per_scenario: usize, target: usize) -> SyntheticConfig {
    let mut config = SyntheticConfig::default().with_seed(seed).with_target_samples(target);
    config.heatwave = config.heatwave.with_count(per_scenario);
    config.storm = config.storm.with_count(per_scenario);
    config.late_frost = config.late_frost.with_count(per_scenario);
    config
}

fn fitted_scaler() -> MinMaxScaler {
    let rows: Vec<[f64; FEATURE_COUNT]> = hourly(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(), 24 * 30)
        .iter()
        .map(|r| r.features())
        .collect();
    MinMaxScaler::fit(&rows).unwrap()
}

// =============================================================================
// Chronological partitioning
// =============================================================================

#[test]
fn evaluation_year_is_held_out() {
    let corpus = multi_year_corpus();
    let dataset = Partitioner::new(PartitionConfig::new(2024)).run(&corpus).unwrap();

    assert!(dataset.train.rows.iter().all(|r| r.timestamp.year() < 2024));
    assert!(!dataset.validation.is_empty());
    assert!(!dataset.test.is_empty());
    for row in &dataset.validation.rows {
        assert_eq!(row.timestamp.year(), 2024);
        assert_eq!(row.timestamp.month() % 2, 1);
        assert!(!row.is_synthetic);
    }
    for row in &dataset.test.rows {
        assert_eq!(row.timestamp.year(), 2024);
        assert_eq!(row.timestamp.month() % 2, 0);
        assert!(!row.is_synthetic);
    }
    assert_eq!(
        dataset.train.len() + dataset.validation.len() + dataset.test.len(),
        corpus.len()
    );
}

#[test]
fn synthetic_rows_only_train() {
    let mut corpus = multi_year_corpus();
    let history: Vec<FeatureRow> = corpus.iter().filter(|r| r.timestamp().year() < 2024).copied().collect();
    let config = small_synthetic(11, 100, 500);
    let synthetic = SyntheticGenerator::new(config).unwrap().generate(&history);
    corpus.extend(synthetic);

    let dataset = Partitioner::new(PartitionConfig::default()).run(&corpus).unwrap();
    assert_eq!(dataset.train.synthetic_count(), 500);
    assert!(dataset.train.rows.iter().all(|r| r.timestamp.year() < 2024));
    assert_eq!(dataset.validation.synthetic_count(), 0);
    assert_eq!(dataset.test.synthetic_count(), 0);

    // Synthetic rows follow the chronologically ordered real history.
    let first_synthetic = dataset.train.rows.iter().position(|r| r.is_synthetic).unwrap();
    assert!(dataset.train.rows[first_synthetic..].iter().all(|r| r.is_synthetic));
    assert!(dataset.train.rows[..first_synthetic]
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn scaler_is_fit_on_train_only() {
    let mut corpus = hourly(Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(), 200);
    // An outlier in the evaluation year must not move the fitted range.
    corpus.push(FeatureRow::real(Observation::new(
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        60.0,
        50.0,
        1000.0,
        3.0,
        0.0,
    )));
    let dataset = Partitioner::new(PartitionConfig::default()).run(&corpus).unwrap();
    let scaler = dataset.artifact.scaler();
    assert!(scaler.data_max()[0] < 60.0);
    assert!(dataset.validation.rows[0].features[0] > 1.0);
}

#[test]
fn empty_train_is_insufficient() {
    let corpus = hourly(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 48);
    assert!(matches!(
        Partitioner::new(PartitionConfig::default()).run(&corpus),
        Err(MeteoError::InsufficientData { .. })
    ));
}

// =============================================================================
// Forecasting with stub models
// =============================================================================

#[test]
fn constant_stub_gives_constant_clear_forecast() {
    let scaler = fitted_scaler();
    let last = Utc.with_ymd_and_hms(2024, 4, 10, 6, 0, 0).unwrap();

    let stub_scaler = scaler.clone();
    let model = FnModel::new("constant", move |_w: &[Vec<f64>]| {
        let mut row = vec![20.0, 50.0, 1013.0, 5.0, 0.0];
        row.extend_from_slice(&encode(last).to_array());
        let scaled = stub_scaler.transform_row(&row)?;
        Ok(scaled[..PHYSICAL_COUNT].to_vec())
    });

    let forecaster = AutoregressiveForecaster::new(model, &scaler, ForecastConfig::default()).unwrap();
    let seed = vec![vec![0.0; FEATURE_COUNT]; 24];
    let table = forecaster.forecast(&seed, last).unwrap();

    assert_eq!(table.len(), 24);
    let mut previous = last;
    for record in &table {
        assert_relative_eq!(record.temperature, 20.0);
        assert_relative_eq!(record.humidity, 50.0);
        assert_relative_eq!(record.pressure, 1013.0);
        assert_relative_eq!(record.wind_speed, 5.0);
        assert_eq!(record.precipitation, 0.0);
        assert_eq!(record.condition, WeatherCondition::Clear);
        assert!(record.timestamp > previous);
        previous = record.timestamp;
    }
    assert_eq!(table.records()[23].timestamp, last + Duration::hours(24));
}

#[test]
fn drizzle_below_noise_floor_is_dry() {
    let scaler = fitted_scaler();
    let last = Utc.with_ymd_and_hms(2024, 11, 2, 18, 0, 0).unwrap();

    let stub_scaler = scaler.clone();
    let model = FnModel::new("drizzle", move |_w: &[Vec<f64>]| {
        let mut row = vec![8.0, 90.0, 1002.0, 3.0, 0.05];
        row.extend_from_slice(&encode(last).to_array());
        Ok(stub_scaler.transform_row(&row)?[..PHYSICAL_COUNT].to_vec())
    });

    let forecaster = AutoregressiveForecaster::new(model, &scaler, ForecastConfig::default()).unwrap();
    let table = forecaster.forecast(&vec![vec![0.5; FEATURE_COUNT]; 24], last).unwrap();
    for record in &table {
        assert_eq!(record.precipitation, 0.0);
        assert_ne!(record.condition, WeatherCondition::Rain);
    }
    assert_eq!(table.total_precipitation(), 0.0);
}

#[test]
fn model_error_aborts_forecast() {
    let scaler = fitted_scaler();
    let calls = std::cell::Cell::new(0);
    let model = FnModel::new("fails at step 5", |_w: &[Vec<f64>]| {
        calls.set(calls.get() + 1);
        if calls.get() == 5 {
            Err(MeteoError::ModelInvocation("out of memory".to_string()))
        } else {
            Ok(vec![0.5; PHYSICAL_COUNT])
        }
    });
    let forecaster = AutoregressiveForecaster::new(&model, &scaler, ForecastConfig::default()).unwrap();
    let result = forecaster.forecast(&vec![vec![0.5; FEATURE_COUNT]; 24], Utc::now());
    assert!(matches!(result, Err(MeteoError::ModelInvocation(_))));
    assert_eq!(calls.get(), 5);
}

#[test]
fn heat_forecast_raises_alerts() {
    let scaler = MinMaxScaler::from_parts(
        vec![-20.0, 0.0, 950.0, 0.0, 0.0, -1.0, -1.0, -1.0, -1.0],
        vec![65.0, 100.0, 100.0, 30.0, 20.0, 2.0, 2.0, 2.0, 2.0],
    )
    .unwrap();
    // 40 °C, 17 m/s wind, dry.
    let model = FnModel::new("heat", |_w: &[Vec<f64>]| Ok(vec![60.0 / 65.0, 0.2, 0.6, 17.0 / 30.0, 0.0]));
    let forecaster = AutoregressiveForecaster::new(model, scaler, ForecastConfig::default()).unwrap();
    let table = forecaster
        .forecast(&vec![vec![0.5; FEATURE_COUNT]; 24], Utc.with_ymd_and_hms(2024, 7, 20, 12, 0, 0).unwrap())
        .unwrap();

    let config = PipelineConfig::default();
    let kinds: Vec<AlertKind> = analyze(&table, &config.alerts).iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::ExtremeHeat, AlertKind::StrongWind]);
}

// =============================================================================
// Synthetic generation
// =============================================================================

#[test]
fn heatwave_generator_shape() {
    let mut generator = SyntheticGenerator::new(SyntheticConfig::default().with_seed(2024)).unwrap();
    let rows = generator.heatwave(750);
    assert_eq!(rows.len(), 750);
    for row in &rows {
        let obs = row.observation();
        assert!(row.is_synthetic());
        assert_eq!(obs.precipitation, 0.0);
        assert!((40.0..=44.0).contains(&obs.temperature));
        assert!((0.0..=100.0).contains(&obs.humidity));
    }
}

// =============================================================================
// Reproducibility
// =============================================================================

fn prepare_into(dir: &Path, seed: u64) {
    let mut corpus = multi_year_corpus();
    let config = small_synthetic(seed, 50, 300);
    corpus.extend(SyntheticGenerator::new(config).unwrap().generate(&corpus));
    let dataset = Partitioner::new(PartitionConfig::default()).run(&corpus).unwrap();
    dataset.save(dir, dir.join("scalers").join("minmax_scaler.json")).unwrap();
}

#[test]
fn identical_seed_gives_identical_partitions() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    prepare_into(a.path(), 99);
    prepare_into(b.path(), 99);

    for kind in PartitionKind::ALL {
        let left = fs::read(kind.path_in(a.path())).unwrap();
        let right = fs::read(kind.path_in(b.path())).unwrap();
        assert_eq!(left, right, "{kind} differs");
    }
    let left = fs::read(a.path().join("scalers").join("minmax_scaler.json")).unwrap();
    let right = fs::read(b.path().join("scalers").join("minmax_scaler.json")).unwrap();
    assert_eq!(left, right);
}

#[test]
fn persisted_partitions_feed_the_windower() {
    let dir = tempfile::tempdir().unwrap();
    prepare_into(dir.path(), 5);

    let artifact = ScalerArtifact::load(dir.path().join("scalers").join("minmax_scaler.json")).unwrap();
    assert_eq!(artifact.scaler().n_features(), FEATURE_COUNT);

    let test = meteo_forecast::partition::Partition::load(PartitionKind::Test, dir.path()).unwrap();
    let windower = SequenceWindower::new(WindowConfig::new(8, 1)).unwrap();
    // Rows are 6 hours apart, so no contiguous hourly segment is long enough.
    assert!(windower.windows_by_segment(&test.rows).is_empty());
    assert_eq!(windower.windows(&test.rows).len(), windower.expected_pairs(test.len()));
}

// =============================================================================
// Full pipeline from an archive export
// =============================================================================

fn write_archive(path: &Path) {
    let mut text = String::from(
        "latitude,longitude,elevation,utc_offset_seconds,timezone,timezone_abbreviation\n\
44.43,26.1,81.0,0,GMT,GMT\n\
\n\
time,temperature_2m (°C),relative_humidity_2m (%),surface_pressure (hPa),wind_speed_10m (m/s),precipitation (mm)\n",
    );
    for (start, hours) in [
        (Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap(), 24 * 14),
        (Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(), 24 * 4),
        (Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(), 24 * 4),
    ] {
        for row in hourly(start, hours) {
            let o = row.observation();
            // Leave a gap for the loader to interpolate.
            let temperature = if o.timestamp.format("%H").to_string() == "07" {
                String::new()
            } else {
                format!("{:.1}", o.temperature)
            };
            text.push_str(&format!(
                "{},{},{:.0},{:.1},{:.1},{:.2}\n",
                o.timestamp.format("%Y-%m-%dT%H:%M"),
                temperature,
                o.humidity,
                o.pressure,
                o.wind_speed,
                o.precipitation
            ));
        }
    }
    fs::write(path, text).unwrap();
}

#[test]
fn pipeline_prepares_evaluates_and_forecasts() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("archive.csv");
    write_archive(&archive);

    let mut config = PipelineConfig::default();
    config.synthetic = small_synthetic(1, 100, 400);
    let layout = ArtifactLayout::new(dir.path().join("data"));
    let pipeline = Pipeline::new(config.clone(), layout).unwrap();

    let source = CsvArchiveSource::new(&archive);
    let location = Location::new("Bucharest", 44.43, 26.10);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    let report = pipeline.prepare(&source, &location, start, end).unwrap();
    assert_eq!(report.acquisition, StageOutcome::Computed);
    assert_eq!(report.real_rows, 24 * 22);
    assert_eq!(report.synthetic_rows, 400);
    assert_eq!(report.validation_rows, 24 * 4);
    assert_eq!(report.test_rows, 24 * 4);

    let dataset = pipeline.load_dataset().unwrap();
    assert_eq!(dataset.train.synthetic_count(), 400);
    assert!(dataset.train.rows.iter().all(|r| r.timestamp.year() < 2024));

    let evaluation = pipeline.evaluate(&Persistence::new()).unwrap();
    assert_eq!(evaluation.samples, 24 * 4 - 25);

    // Online path: persisted scaler, last day of history, 24-hour forecast.
    let artifact = pipeline.load_scaler().unwrap();
    let history: Vec<Observation> = hourly(Utc.with_ymd_and_hms(2024, 4, 3, 0, 0, 0).unwrap(), 48)
        .iter()
        .map(|r| *r.observation())
        .collect();
    let model: Box<dyn StepModel> = Box::new(Persistence::new());
    let forecaster = AutoregressiveForecaster::new(model, artifact.scaler(), config.forecast.clone()).unwrap();
    let table = forecaster.forecast_from_history(&history).unwrap();
    assert_eq!(table.len(), 24);
    assert_eq!(table.records()[0].timestamp, history[47].timestamp + Duration::hours(1));
    assert!(table.iter().all(|r| (0.0..=100.0).contains(&r.humidity)));

    let csv = table.to_csv_string().unwrap();
    assert_eq!(csv.lines().count(), 25);
}

#[test]
fn missing_archive_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::default(), ArtifactLayout::new(dir.path())).unwrap();
    let source = CsvArchiveSource::new(dir.path().join("nope.csv"));
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    match pipeline.prepare(&source, &Location::new("X", 0.0, 0.0), day, day) {
        Err(MeteoError::MissingArtifact { hint, .. }) => assert!(hint.contains("fetch")),
        other => panic!("expected missing artifact, got {other:?}"),
    }
}
