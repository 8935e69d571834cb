//! Loading, cleaning and persisting tabular weather data.
//!
//! - [`loader`]: raw archive exports with column renaming and schema checks
//! - [`clean`]: missing-value policies and gap interpolation
//! - [`store`]: CSV persistence of feature rows and scaled partitions
//! - [`source`]: the [`WeatherSource`] fetch interface

pub mod clean;
pub mod loader;
pub mod source;
pub mod store;

pub use clean::{clean, interpolate_series, MissingValuePolicy};
pub use loader::{canonical_column, load_raw_csv, parse_raw_csv, COLUMN_RENAMES};
pub use source::{CsvArchiveSource, Location, WeatherSource};
pub use store::{
    parse_timestamp, read_feature_rows, read_scaled_rows, write_feature_rows, write_scaled_rows,
};
