//! Dashboard views derived from the location snapshots.

use crate::{LocationCollection, LocationRecord, Province};
use serde::Serialize;

/// Maximum number of search suggestions offered at once.
pub const MAX_SUGGESTIONS: usize = 5;

/// A location placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub location: String,
    pub province: Province,
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
    pub data: LocationRecord,
}

impl MapMarker {
    /// Markers for every record in `collection` with a known position.
    pub fn from_collection(province: Province, collection: &LocationCollection) -> Vec<Self> {
        collection
            .data
            .iter()
            .filter_map(|record| {
                let coordinates = record.coordinates.lon_lat()?;
                Some(Self {
                    location: record.location.clone(),
                    province,
                    coordinates,
                    data: record.clone(),
                })
            })
            .collect()
    }
}

/// Location names matching `query` by location or province name.
///
/// Matching is a case-insensitive substring test; an empty query matches
/// nothing.
pub fn suggestions<'a>(markers: &'a [MapMarker], query: &str) -> Vec<&'a str> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    markers
        .iter()
        .filter(|m| {
            m.location.to_lowercase().contains(&needle)
                || m.province.name().to_lowercase().contains(&needle)
        })
        .map(|m| m.location.as_str())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// The marker a submitted search selects.
///
/// A province name selects that province's first marker; anything else
/// selects the first location whose name contains the query.
pub fn resolve<'a>(markers: &'a [MapMarker], query: &str) -> Option<&'a MapMarker> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    if let Some(province) = Province::ALL
        .into_iter()
        .find(|p| query.eq_ignore_ascii_case(p.name()))
    {
        return markers.iter().find(|m| m.province == province);
    }
    let needle = query.to_lowercase();
    markers
        .iter()
        .find(|m| m.location.to_lowercase().contains(&needle))
}
