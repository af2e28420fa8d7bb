//! Hazard report types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, GeoError};

/// Identifier of a reported hazard, as assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardId(String);

impl HazardId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HazardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HazardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for HazardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of reported hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    Pothole,
    Accident,
    SpeedCamera,
    PublicService,
    Other,
}

impl HazardCategory {
    /// Every category, in display order.
    pub const ALL: [HazardCategory; 5] = [
        HazardCategory::Pothole,
        HazardCategory::Accident,
        HazardCategory::SpeedCamera,
        HazardCategory::PublicService,
        HazardCategory::Other,
    ];

    /// Stable key used in config files and the hazard feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardCategory::Pothole => "pothole",
            HazardCategory::Accident => "accident",
            HazardCategory::SpeedCamera => "speed_camera",
            HazardCategory::PublicService => "public_service",
            HazardCategory::Other => "other",
        }
    }

    /// Lenient parse of a feed report type. Unknown types map to `Other`.
    pub fn from_report_type(s: &str) -> Self {
        s.parse().unwrap_or(HazardCategory::Other)
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pothole" => Ok(HazardCategory::Pothole),
            "accident" => Ok(HazardCategory::Accident),
            "speed_camera" | "speedcamera" => Ok(HazardCategory::SpeedCamera),
            "public_service" | "publicservice" => Ok(HazardCategory::PublicService),
            "other" => Ok(HazardCategory::Other),
            other => Err(format!("unknown hazard category '{}'", other)),
        }
    }
}

/// A reported hazard at a fixed location.
///
/// Hazards are immutable snapshots: every refresh replaces the engine's view
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Backend identifier.
    pub id: HazardId,
    /// Kind of hazard.
    pub category: HazardCategory,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Hazard {
    /// Create a hazard.
    pub fn new(
        id: impl Into<HazardId>,
        category: HazardCategory,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            latitude,
            longitude,
        }
    }

    /// Validated coordinate of the hazard.
    pub fn coordinate(&self) -> Result<Coordinate, GeoError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}
