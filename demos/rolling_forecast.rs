//! Rolling 24-hour forecast over a generated archive.
//!
//! Prepares a dataset from an in-memory history, scores two baselines on the
//! held-out test months, then rolls the better one forward from the last day
//! of history and lists any weather alerts.
//!
//! Run with: cargo run --example rolling_forecast

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use meteo_forecast::config::PipelineConfig;
use meteo_forecast::core::Observation;
use meteo_forecast::data::{Location, WeatherSource};
use meteo_forecast::forecast::{analyze, AutoregressiveForecaster};
use meteo_forecast::models::baseline::{Persistence, WindowAverage};
use meteo_forecast::models::{BoxedModel, StepModel};
use meteo_forecast::pipeline::{ArtifactLayout, Pipeline};

/// Seasonal hourly history with a diurnal cycle and periodic showers.
struct GeneratedHistory;

impl WeatherSource for GeneratedHistory {
    fn fetch(
        &self,
        _location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> meteo_forecast::Result<Vec<Observation>> {
        let mut ts: DateTime<Utc> = start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let stop = end.and_hms_opt(23, 0, 0).unwrap().and_utc();
        let mut rows = Vec::new();
        let mut i = 0usize;
        while ts <= stop {
            let hour = i as f64;
            let season = (hour / 8766.0 * std::f64::consts::TAU - 1.9).sin();
            let diurnal = (hour / 24.0 * std::f64::consts::TAU - 2.0).sin();
            let shower = if i % 97 < 4 { 0.4 + (i % 3) as f64 } else { 0.0 };
            rows.push(Observation::new(
                ts,
                11.0 + 13.0 * season + 5.0 * diurnal,
                70.0 - 15.0 * diurnal + if shower > 0.0 { 15.0 } else { 0.0 },
                1013.0 + 6.0 * (hour / 90.0).sin(),
                3.5 + 2.5 * (hour / 31.0).sin().abs(),
                shower,
            ));
            ts += Duration::hours(1);
            i += 1;
        }
        Ok(rows)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== meteo-forecast Rolling Forecast ===\n");

    let dir = tempfile::tempdir()?;
    let mut config = PipelineConfig::default();
    config.synthetic = config.synthetic.with_seed(42).with_target_samples(8_000);

    let pipeline = Pipeline::new(config.clone(), ArtifactLayout::new(dir.path()))?;
    let location = Location::new("Bucharest", 44.43, 26.10);
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    // 1. Acquisition, augmentation, partitioning
    let report = pipeline.prepare(&GeneratedHistory, &location, start, end)?;
    println!("Real rows:       {}", report.real_rows);
    println!("Synthetic rows:  {}", report.synthetic_rows);
    println!(
        "Train / val / test: {} / {} / {}",
        report.train_rows, report.validation_rows, report.test_rows
    );

    // 2. Baseline accuracy on the even months of the evaluation year
    println!("\n--- Test Accuracy (MAE) ---");
    let candidates: Vec<BoxedModel> = vec![Box::new(Persistence::new()), Box::new(WindowAverage::new(6))];
    let mut best: Option<(BoxedModel, f64)> = None;
    for model in candidates {
        let evaluation = pipeline.evaluate(&model)?;
        let temperature = evaluation.get("temperature").map_or(f64::NAN, |m| m.mae);
        println!(
            "{:>14}: temperature {:.3} °C over {} windows",
            model.name(),
            temperature,
            evaluation.samples
        );
        if best.as_ref().map_or(true, |(_, mae)| temperature < *mae) {
            best = Some((model, temperature));
        }
    }
    let (model, _) = best.ok_or("no candidate model")?;

    // 3. Roll the chosen model forward from the last two days of history
    let history = GeneratedHistory.fetch(&location, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(), end)?;
    let artifact = pipeline.load_scaler()?;
    let forecaster = AutoregressiveForecaster::new(model, artifact.scaler(), config.forecast.clone())?;
    let table = forecaster.forecast_from_history(&history)?;

    println!("\n--- 24-Hour Forecast ({}) ---", forecaster.model().name());
    println!(
        "{:>17} {:>7} {:>7} {:>8} {:>6} {:>7} {:>6}",
        "time", "temp", "hum", "press", "wind", "precip", "sky"
    );
    println!("{:-<65}", "");
    for r in &table {
        println!(
            "{:>17} {:>7.1} {:>7.1} {:>8.1} {:>6.1} {:>7.2} {:>6}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.temperature,
            r.humidity,
            r.pressure,
            r.wind_speed,
            r.precipitation,
            r.condition
        );
    }

    // 4. Alerts
    println!("\n--- Alerts ---");
    let alerts = analyze(&table, &config.alerts);
    if alerts.is_empty() {
        println!("  none");
    }
    for alert in &alerts {
        println!("  [{:?}] {}", alert.severity(), alert.message);
    }

    let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(table.records()[0].timestamp, first);

    Ok(())
}
