//! Proximity checking and alert state.
//!
//! [`ProximityEngine`] is the entry point. It owns the hazard snapshot and a
//! [`HazardTracker`] holding each hazard's [`AlertState`], and runs one check
//! cycle at a time behind a [`SingleFlight`] token.

mod engine;
mod single_flight;
mod state;
mod stats;

pub use engine::{CheckOutcome, CheckReport, EngineBuilder, EngineCollaborators, ProximityEngine};
pub use single_flight::{FlightPermit, SingleFlight};
pub use state::{AlertState, Evaluation, FiredAlert, HazardTracker};
pub use stats::EngineStatsSnapshot;
