//! File-backed access to the pre-compiled JSON data.
//!
//! Files are read on every call; nothing is cached, so replacing a file on
//! disk is picked up by the next request.

use crate::{HistoricalLocation, LocationCollection, MapMarker, Province};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// A directory containing the per-province JSON files.
#[derive(Debug, Clone)]
pub struct DataSource {
    root: PathBuf,
}

impl DataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file as untyped JSON, exactly as stored.
    pub fn read_raw(&self, file: &str) -> Result<serde_json::Value, DataError> {
        self.read(file)
    }

    /// Latest snapshot for a province.
    pub fn locations(&self, province: Province) -> Result<LocationCollection, DataError> {
        self.read(province.locations_file())
    }

    /// Historical series for a province.
    pub fn history(&self, province: Province) -> Result<Vec<HistoricalLocation>, DataError> {
        let file = province
            .history_file()
            .ok_or(DataError::NoHistory(province))?;
        self.read(file)
    }

    /// Markers for every province, in [`Province::ALL`] order.
    pub fn markers(&self) -> Result<Vec<MapMarker>, DataError> {
        let mut markers = Vec::new();
        for province in Province::ALL {
            let collection = self.locations(province)?;
            markers.extend(MapMarker::from_collection(province, &collection));
        }
        Ok(markers)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, DataError> {
        let path = self.root.join(file);
        let content = std::fs::read_to_string(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DataError::Json { path, source })
    }
}

/// Errors loading dashboard data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no historical data is compiled for {0}")]
    NoHistory(Province),
    #[error("no historical data for location: {0}")]
    LocationNotFound(String),
}

impl DataError {
    /// Whether the error means "nothing there" rather than a broken file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoHistory(_) | Self::LocationNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, value: serde_json::Value) {
        std::fs::write(dir.path().join(file), value.to_string()).unwrap();
    }

    fn seeded() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "soctrang-locations.json",
            json!({
                "date_created": "2024-05-01",
                "datetime_format": "%d/%m/%Y",
                "data": [
                    { "location": "Vinh Chau", "coordinates": [9.33, 105.98] },
                    { "location": "Long Phu", "coordinates": "Unknown" }
                ]
            }),
        );
        write(
            &dir,
            "travinh-locations.json",
            json!({ "data": [{ "location": "Cau Ngang", "coordinates": [9.80, 106.44] }] }),
        );
        dir
    }

    #[test]
    fn markers_skip_unknown_positions() {
        let dir = seeded();
        let source = DataSource::new(dir.path());
        let markers = source.markers().unwrap();
        let names: Vec<_> = markers.iter().map(|m| m.location.as_str()).collect();
        assert_eq!(names, vec!["Vinh Chau", "Cau Ngang"]);
        assert_eq!(markers[1].province, Province::TraVinh);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let source = DataSource::new(dir.path());
        let err = source.locations(Province::TraVinh).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn malformed_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("compiled_historical_data_st.json"), "[{").unwrap();
        let source = DataSource::new(dir.path());
        let err = source.history(Province::SocTrang).unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
    }

    #[test]
    fn province_without_history() {
        let dir = seeded();
        let source = DataSource::new(dir.path());
        let err = source.history(Province::TraVinh).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn raw_read_is_verbatim() {
        let dir = seeded();
        let source = DataSource::new(dir.path());
        let raw = source.read_raw("travinh-locations.json").unwrap();
        assert_eq!(raw["data"][0]["location"], "Cau Ngang");
    }
}
