//! Property-based tests for the preparation and forecasting stages.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated observations and model outputs.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use meteo_forecast::core::{FeatureRow, Observation, FEATURE_COUNT};
use meteo_forecast::forecast::{AutoregressiveForecaster, ForecastConfig};
use meteo_forecast::models::FnModel;
use meteo_forecast::partition::{PartitionConfig, Partitioner};
use meteo_forecast::synthetic::{SyntheticConfig, SyntheticGenerator};
use meteo_forecast::transform::{encode_seconds, window, MinMaxScaler};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
}

/// Strategy for one physically plausible hour of weather.
fn physical_strategy() -> impl Strategy<Value = [f64; 5]> {
    (
        -30.0..45.0_f64,
        0.0..100.0_f64,
        950.0..1050.0_f64,
        0.0..30.0_f64,
        0.0..15.0_f64,
    )
        .prop_map(|(t, h, p, w, r)| [t, h, p, w, r])
}

/// Strategy for an hourly real series starting at [`base`].
fn series_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<FeatureRow>> {
    prop::collection::vec(physical_strategy(), min_len..max_len).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| FeatureRow::real(Observation::from_physical(base() + Duration::hours(i as i64), v)))
            .collect()
    })
}

fn test_scaler() -> MinMaxScaler {
    MinMaxScaler::from_parts(
        vec![-30.0, 0.0, 950.0, 0.0, 0.0, -1.0, -1.0, -1.0, -1.0],
        vec![75.0, 100.0, 100.0, 30.0, 15.0, 2.0, 2.0, 2.0, 2.0],
    )
    .unwrap()
}

// =============================================================================
// Property: cyclical features lie on the unit circle
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn time_features_on_unit_circle(seconds in -4.0e9..4.0e9_f64) {
        let f = encode_seconds(seconds);
        prop_assert!((f.day_sin.powi(2) + f.day_cos.powi(2) - 1.0).abs() < 1e-9);
        prop_assert!((f.year_sin.powi(2) + f.year_cos.powi(2) - 1.0).abs() < 1e-9);
    }
}

// =============================================================================
// Property: window count formula
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn window_count_matches_formula(len in 0usize..120, lookback in 1usize..40, horizon in 1usize..6) {
        let rows: Vec<Vec<f64>> = (0..len).map(|i| vec![i as f64; 3]).collect();
        let pairs = window(&rows, lookback, horizon, &[0, 1]);
        let expected = if len > lookback + horizon { len - lookback - horizon } else { 0 };
        prop_assert_eq!(pairs.len(), expected);

        for (i, pair) in pairs.iter().enumerate() {
            prop_assert_eq!(pair.input.len(), lookback);
            // Target is row `i + horizon`, the input ends at row `i - 1`.
            let last_input = pair.input[lookback - 1][0];
            prop_assert_eq!(pair.target[0], last_input + (horizon + 1) as f64);
            prop_assert_eq!(pair.input[0][0], i as f64);
        }
    }
}

// =============================================================================
// Property: training partition spans [0, 1] after scaling
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn train_is_unit_scaled(rows in series_strategy(2, 120)) {
        let dataset = Partitioner::new(PartitionConfig::default()).run(&rows).unwrap();
        let train = dataset.train.features();

        for c in 0..FEATURE_COUNT {
            let column: Vec<f64> = train.iter().map(|r| r[c]).collect();
            let min = column.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(min.abs() < 1e-9, "column {} min {}", c, min);
            // Constant columns collapse to 0.
            prop_assert!((max - 1.0).abs() < 1e-9 || max.abs() < 1e-9, "column {} max {}", c, max);
        }
    }

    #[test]
    fn evaluation_rows_split_by_month_parity(
        hours in prop::collection::vec(0i64..(24 * 365 * 5), 1..200)
    ) {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let corpus: Vec<FeatureRow> = hours
            .iter()
            .map(|&h| FeatureRow::real(Observation::new(start + Duration::hours(h), 10.0, 50.0, 1000.0, 2.0, 0.0)))
            .collect();
        let split = Partitioner::new(PartitionConfig::new(2024)).split(&corpus);

        prop_assert!(split.train.iter().all(|r| r.timestamp().year() < 2024));
        prop_assert!(split.validation.iter().all(|r| r.timestamp().year() == 2024 && r.timestamp().month() % 2 == 1));
        prop_assert!(split.test.iter().all(|r| r.timestamp().year() == 2024 && r.timestamp().month() % 2 == 0));
        prop_assert_eq!(
            split.train.len() + split.validation.len() + split.test.len() + split.dropped,
            corpus.len()
        );
    }
}

// =============================================================================
// Property: forecasts respect physical constraints
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(60))]

    #[test]
    fn forecast_is_physical(
        output in prop::collection::vec(-3.0..3.0_f64, 5),
        noise_floor in 0.0..1.0_f64,
        steps in 1usize..30,
    ) {
        let model = FnModel::new("random", move |_w: &[Vec<f64>]| Ok(output.clone()));
        let config = ForecastConfig::default().with_steps(steps).with_noise_floor(noise_floor);
        let forecaster = AutoregressiveForecaster::new(model, test_scaler(), config).unwrap();

        let seed = vec![vec![0.5; FEATURE_COUNT]; 24];
        let table = forecaster.forecast(&seed, base()).unwrap();
        prop_assert_eq!(table.len(), steps);

        let mut previous = base();
        for record in &table {
            prop_assert!((0.0..=100.0).contains(&record.humidity));
            prop_assert!(record.wind_speed >= 0.0);
            // Rounding to 2 decimals may pull a value at the floor just below it.
            prop_assert!(record.precipitation == 0.0 || record.precipitation >= noise_floor - 0.005);
            prop_assert_eq!(record.timestamp - previous, Duration::hours(1));
            previous = record.timestamp;
        }
    }
}

// =============================================================================
// Property: synthetic generators honour requested counts
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn heatwave_count_and_shape(n in 0usize..400, seed in any::<u64>()) {
        let mut generator = SyntheticGenerator::new(SyntheticConfig::default().with_seed(seed)).unwrap();
        let rows = generator.heatwave(n);
        prop_assert_eq!(rows.len(), n);
        for row in &rows {
            prop_assert!(row.is_synthetic());
            prop_assert_eq!(row.observation().precipitation, 0.0);
            prop_assert!(matches!(row.timestamp().month(), 6..=8));
        }
    }
}
