//! Reported road hazards and where they come from.
//!
//! - [`Hazard`] / [`HazardCategory`] - the data the engine alerts on
//! - [`HazardRepository`] - the fetch seam the engine depends on
//! - [`StaticHazardRepository`] - fixed in-memory set (replays, tests)
//! - [`HttpHazardRepository`] - the backend's nearby-hazards endpoint

mod http;
mod model;
mod repository;

pub use http::{decode_feed, HttpHazardRepository, HttpRepositoryConfig, DEFAULT_FETCH_TIMEOUT};
pub use model::{Hazard, HazardCategory, HazardId};
pub use repository::{FetchError, HazardRepository, StaticHazardRepository};
