//! HazardWatch - proximity alerting for reported road hazards
//!
//! This library provides the engine that watches the device position and
//! raises a single spoken alert each time the user approaches a reported
//! hazard (pothole, accident, speed camera, ...).
//!
//! # Architecture
//!
//! ```text
//! PositionSource ──► ProximityEngine ──► HazardRepository (fetch nearby)
//!  (fg + bg)              │
//!                         ├──► HazardTracker (Armed/Fired hysteresis)
//!                         └──► DispatchGate ──► AlertDispatcher (speech, screen)
//! ```
//!
//! Every collaborator is injected through a trait so the engine runs the same
//! way on a phone, in a route replay, or inside a unit test.

use std::future::Future;
use std::pin::Pin;

pub mod alert;
pub mod geo;
pub mod hazard;
pub mod position;
pub mod proximity;
pub mod settings;

/// Library version, as declared in Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
