//! Sensor location snapshots.
//!
//! A collection file holds one record per monitoring location. Besides the
//! fixed fields, each record carries an open set of named measurements shaped
//! `{ "name", "value", "unit" }`; those are kept verbatim so a record
//! serializes back to the same document it was read from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel used by the data files for locations without a known position.
pub const UNKNOWN_COORDINATES: &str = "Unknown";

/// A province's snapshot of every monitoring location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCollection {
    /// When the file was compiled.
    #[serde(default)]
    pub date_created: String,
    /// Format string describing `date`/`time` fields.
    #[serde(default)]
    pub datetime_format: String,
    pub data: Vec<LocationRecord>,
}

/// One monitoring location and its latest readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub coordinates: Coordinates,
    /// Every other field, measurements included.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LocationRecord {
    /// Named measurements on this record, in field-name order.
    ///
    /// Fields that are not shaped like a measurement are skipped.
    pub fn measurements(&self) -> impl Iterator<Item = (&str, Measurement)> + '_ {
        self.fields.iter().filter_map(|(key, value)| {
            Measurement::deserialize(value)
                .ok()
                .map(|measurement| (key.as_str(), measurement))
        })
    }

    /// Look up a single measurement by its field name.
    pub fn measurement(&self, key: &str) -> Option<Measurement> {
        self.fields
            .get(key)
            .and_then(|value| Measurement::deserialize(value).ok())
    }
}

/// A single reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: MeasurementValue,
    pub unit: String,
}

/// Readings are numeric in most files, but some sensors report text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasurementValue {
    Number(f64),
    Text(String),
}

impl MeasurementValue {
    /// Numeric view of the reading, parsing text values when possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for MeasurementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Position of a location, as `[latitude, longitude]` in the data files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates", into = "RawCoordinates")]
pub enum Coordinates {
    Known { lat: f64, lon: f64 },
    Unknown,
}

impl Coordinates {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    /// `[longitude, latitude]`, the order map libraries expect.
    pub fn lon_lat(&self) -> Option<[f64; 2]> {
        match *self {
            Self::Known { lat, lon } => Some([lon, lat]),
            Self::Unknown => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCoordinates {
    Pair([f64; 2]),
    Sentinel(String),
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoordinatesParseError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        match raw {
            RawCoordinates::Pair([lat, lon]) => Ok(Self::Known { lat, lon }),
            RawCoordinates::Sentinel(s) if s == UNKNOWN_COORDINATES => Ok(Self::Unknown),
            RawCoordinates::Sentinel(s) => Err(CoordinatesParseError(s)),
        }
    }
}

impl From<Coordinates> for RawCoordinates {
    fn from(coordinates: Coordinates) -> Self {
        match coordinates {
            Coordinates::Known { lat, lon } => Self::Pair([lat, lon]),
            Coordinates::Unknown => Self::Sentinel(UNKNOWN_COORDINATES.to_string()),
        }
    }
}

/// Coordinates were neither a pair nor the `"Unknown"` sentinel.
#[derive(Debug, Clone, thiserror::Error)]
#[error("coordinates must be a [lat, lon] pair or \"Unknown\", got: {0}")]
pub struct CoordinatesParseError(String);
