//! Provinces covered by the dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A province with its own sensor network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "Soc Trang")]
    SocTrang,
    #[serde(rename = "Tra Vinh")]
    TraVinh,
}

impl Province {
    /// Marker order: Soc Trang first, then Tra Vinh.
    pub const ALL: [Province; 2] = [Province::SocTrang, Province::TraVinh];

    /// Human-readable name (`"Soc Trang"`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::SocTrang => "Soc Trang",
            Self::TraVinh => "Tra Vinh",
        }
    }

    /// URL path segment (`"soc-trang"`).
    pub fn slug(&self) -> &'static str {
        match self {
            Self::SocTrang => "soc-trang",
            Self::TraVinh => "tra-vinh",
        }
    }

    /// File holding the latest location snapshot.
    pub fn locations_file(&self) -> &'static str {
        match self {
            Self::SocTrang => "soctrang-locations.json",
            Self::TraVinh => "travinh-locations.json",
        }
    }

    /// File holding compiled historical series, if the province has one.
    pub fn history_file(&self) -> Option<&'static str> {
        match self {
            Self::SocTrang => Some("compiled_historical_data_st.json"),
            Self::TraVinh => None,
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Province {
    type Err = UnknownProvince;

    /// Accepts either the slug or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| s.eq_ignore_ascii_case(p.slug()) || s.eq_ignore_ascii_case(p.name()))
            .ok_or_else(|| UnknownProvince(s.to_string()))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown province: {0}")]
pub struct UnknownProvince(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_slug_and_name() {
        assert_eq!("soc-trang".parse::<Province>().unwrap(), Province::SocTrang);
        assert_eq!("TRA VINH".parse::<Province>().unwrap(), Province::TraVinh);
        assert!("can-tho".parse::<Province>().is_err());
    }

    #[test]
    fn only_soc_trang_has_history() {
        assert!(Province::SocTrang.history_file().is_some());
        assert!(Province::TraVinh.history_file().is_none());
    }
}
