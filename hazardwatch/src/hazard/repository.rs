//! Hazard repository abstraction.
//!
//! The engine asks a [`HazardRepository`] for the hazards around the current
//! position once per check cycle. How the data is fetched (HTTP, local file,
//! test fixture) is the adapter's business.

use thiserror::Error;

use super::Hazard;
use crate::geo;
use crate::position::Position;
use crate::BoxFuture;

/// Errors that can occur while fetching hazards.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Request could not be sent or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status.
    #[error("HTTP {status} from hazard feed")]
    Status { status: u16 },

    /// Response body could not be decoded.
    #[error("Failed to decode hazard feed: {0}")]
    Decode(String),

    /// Repository is not able to serve requests right now.
    #[error("Hazard repository unavailable: {0}")]
    Unavailable(String),
}

/// Source of hazards near a point.
///
/// # Dyn Compatibility
///
/// Uses boxed futures so the engine can hold an `Arc<dyn HazardRepository>`.
pub trait HazardRepository: Send + Sync {
    /// Fetch every hazard within `radius_m` metres of `center`.
    fn fetch_nearby(
        &self,
        center: Position,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<Vec<Hazard>, FetchError>>;
}

/// Repository over a fixed, in-memory set of hazards.
///
/// Filters by great-circle distance; hazards with invalid coordinates are
/// never returned.
#[derive(Debug, Clone, Default)]
pub struct StaticHazardRepository {
    hazards: Vec<Hazard>,
}

impl StaticHazardRepository {
    /// Create a repository over the given hazards.
    pub fn new(hazards: Vec<Hazard>) -> Self {
        Self { hazards }
    }

    /// Number of hazards held (including invalid ones).
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    /// Whether the repository holds no hazards.
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    fn within(&self, center: &Position, radius_m: f64) -> Result<Vec<Hazard>, FetchError> {
        let center = center
            .coordinate()
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        Ok(self
            .hazards
            .iter()
            .filter(|h| match h.coordinate() {
                Ok(coord) => geo::distance_between(&center, &coord).value() <= radius_m,
                Err(_) => false,
            })
            .cloned()
            .collect())
    }
}

impl HazardRepository for StaticHazardRepository {
    fn fetch_nearby(
        &self,
        center: Position,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<Vec<Hazard>, FetchError>> {
        let result = self.within(&center, radius_m);
        Box::pin(async move { result })
    }
}
