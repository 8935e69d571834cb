//! Data transformations for hourly weather features.
//!
//! Provides cyclical time encoding, min-max scaling, the precipitation
//! transform and sequence windowing.
//!
//! # Example
//!
//! ```
//! use meteo_forecast::transform::{window, FeatureScaler, MinMaxScaler};
//!
//! let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
//!
//! // Fit on training rows only, then transform
//! let scaler = MinMaxScaler::fit(&rows).unwrap();
//! let scaled = scaler.transform(&rows).unwrap();
//!
//! // 24-hour lookback, target one step past the window
//! let pairs = window(&scaled, 24, 1, &[0]);
//! assert_eq!(pairs.len(), 30 - 24 - 1);
//! ```

pub mod precipitation;
pub mod scale;
pub mod time_encoding;
pub mod window;

pub use precipitation::PrecipitationTransform;
pub use scale::{FeatureScaler, MinMaxScaler};
pub use time_encoding::{encode, encode_seconds, TimeFeatures};
pub use window::{contiguous_segments, window, SequencePair, SequenceWindower, WindowConfig};
