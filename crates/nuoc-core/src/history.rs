//! Historical measurement series.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Every recorded series for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalLocation {
    pub location: String,
    pub measurements: Vec<MeasurementSeries>,
}

/// One measurement type over time (e.g. salinity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSeries {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<DataPoint>,
}

/// A dated reading. Dates are `dd/mm/yyyy`; values are usually numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: String,
    #[serde(deserialize_with = "value_as_string")]
    pub value: String,
}

/// A series prepared for plotting: points in date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub location: String,
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl HistoricalLocation {
    /// Find the entry for `location` (exact name match).
    pub fn find<'a>(entries: &'a [HistoricalLocation], location: &str) -> Option<&'a Self> {
        entries.iter().find(|entry| entry.location == location)
    }

    /// Build the chart for the measurement at `index`.
    pub fn chart(&self, index: usize) -> Option<ChartSeries> {
        let series = self.measurements.get(index)?;
        let mut points: Vec<&DataPoint> = series.data.iter().collect();
        // Stable, so equal and unparseable dates keep file order.
        points.sort_by(|a, b| compare_dates(&a.date, &b.date));

        Some(ChartSeries {
            location: self.location.clone(),
            label: series.kind.clone(),
            labels: points.iter().map(|p| p.date.clone()).collect(),
            values: points.iter().map(|p| p.value.trim().parse().ok()).collect(),
        })
    }
}

/// Parse a `dd/mm/yyyy` date into a sortable `(year, month, day)`.
pub fn parse_date(date: &str) -> Option<(u32, u32, u32)> {
    let mut parts = date.trim().split('/');
    let day = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let year = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((year, month, day))
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn value_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
