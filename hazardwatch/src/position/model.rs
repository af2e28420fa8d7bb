//! Device position samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, GeoError};

/// A single position fix delivered by a [`PositionSource`](super::PositionSource).
///
/// Positions are ephemeral: the engine consumes them immediately and never
/// keeps them beyond the check cycle they trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy radius in metres, if the platform reports one.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl Position {
    /// Create a position stamped with the current time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::at(latitude, longitude, Utc::now())
    }

    /// Create a position with an explicit timestamp.
    pub fn at(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy_m: None,
        }
    }

    /// Attach a horizontal accuracy.
    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Validated coordinate of this fix.
    pub fn coordinate(&self) -> Result<Coordinate, GeoError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_builder() {
        let pos = Position::new(24.7136, 46.6753).with_accuracy(8.0);
        assert_eq!(pos.accuracy_m, Some(8.0));
        assert!(pos.coordinate().is_ok());
    }

    #[test]
    fn test_position_invalid_coordinate() {
        let pos = Position::new(120.0, 0.0);
        assert!(pos.coordinate().is_err());
    }

    #[test]
    fn test_position_deserializes_without_accuracy() {
        let json = r#"{"latitude":1.0,"longitude":2.0,"timestamp":"2024-01-01T00:00:00Z"}"#;
        let pos: Position = serde_json::from_str(json).unwrap();
        assert_eq!(pos.accuracy_m, None);
        assert_eq!(pos.longitude, 2.0);
    }
}
