//! Core types for the water-quality dashboard.
//!
//! This crate models the pre-compiled sensor data (latest location snapshots
//! and historical series for each province) and the views the dashboard
//! derives from it: map markers, search suggestions and chart series.

mod history;
mod location;
mod province;
mod source;
mod view;

pub use history::{parse_date, ChartSeries, DataPoint, HistoricalLocation, MeasurementSeries};
pub use location::{
    Coordinates, CoordinatesParseError, LocationCollection, LocationRecord, Measurement,
    MeasurementValue, UNKNOWN_COORDINATES,
};
pub use province::{Province, UnknownProvince};
pub use source::{DataError, DataSource};
pub use view::{resolve, suggestions, MapMarker, MAX_SUGGESTIONS};
