//! Per-hazard alert state machine.
//!
//! # State Machine
//!
//! ```text
//! Unseen --[id appears in a snapshot]--> Armed
//! Armed  --[category enabled, d <= inner, gate open]--> Fired   (alert)
//! Fired  --[d > inner + reset_margin]--> Armed
//! any    --[id missing from a successful refresh, or stop()]--> Unseen
//! ```
//!
//! The gap between `inner` and `inner + reset_margin` is the hysteresis band:
//! a fired hazard stays fired while the user hovers around the inner
//! threshold, so GPS noise cannot produce a second alert for the same
//! approach.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::geo::{self, Coordinate, Meters};
use crate::hazard::{Hazard, HazardId};
use crate::settings::EngineConfig;

/// Alert state of a single hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertState {
    /// Not tracked (never seen, pruned, or monitoring restarted).
    Unseen,
    /// Tracked and ready to fire on the next approach.
    Armed,
    /// Alert given for the current approach.
    Fired,
}

impl AlertState {
    /// Short label for logs and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Unseen => "unseen",
            AlertState::Armed => "armed",
            AlertState::Fired => "fired",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hazard that transitioned to `Fired` during an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredAlert {
    pub hazard: Hazard,
    pub distance: Meters,
}

/// Result of evaluating one snapshot against one position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Hazards that fired, in snapshot order.
    pub fired: Vec<FiredAlert>,
    /// Hazards that crossed back out of the hysteresis band.
    pub rearmed: Vec<HazardId>,
    /// Hazards that were eligible to fire but the dispatch gate refused.
    pub suppressed: Vec<HazardId>,
    /// Hazards skipped because their coordinates are invalid.
    pub invalid: usize,
}

/// Tracks the [`AlertState`] of every hazard in the current snapshot.
#[derive(Debug, Default)]
pub struct HazardTracker {
    states: HashMap<HazardId, AlertState>,
}

impl HazardTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a hazard; `Unseen` if it is not tracked.
    pub fn state(&self, id: &HazardId) -> AlertState {
        self.states.get(id).copied().unwrap_or(AlertState::Unseen)
    }

    /// Number of tracked hazards.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no hazards are tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget every hazard.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Run the state machine for every hazard in `hazards`.
    ///
    /// `try_fire` is consulted only for hazards that are otherwise eligible
    /// (armed, category enabled, within the inner distance). Returning
    /// `false` keeps the hazard armed so it can fire on a later cycle.
    pub fn evaluate<F>(
        &mut self,
        position: &Coordinate,
        hazards: &[Hazard],
        config: &EngineConfig,
        mut try_fire: F,
    ) -> Evaluation
    where
        F: FnMut(&Hazard, Meters) -> bool,
    {
        let mut evaluation = Evaluation::default();
        let inner = config.inner_distance_m;
        let reset = config.reset_distance_m();

        for hazard in hazards {
            let coord = match hazard.coordinate() {
                Ok(coord) => coord,
                Err(e) => {
                    tracing::debug!(hazard = %hazard.id, error = %e, "Skipping hazard");
                    evaluation.invalid += 1;
                    continue;
                }
            };

            let distance = geo::distance_between(position, &coord);
            let state = self
                .states
                .entry(hazard.id.clone())
                .or_insert(AlertState::Armed);

            match *state {
                AlertState::Armed
                    if config.is_category_enabled(hazard.category)
                        && distance.value() <= inner =>
                {
                    if try_fire(hazard, distance) {
                        *state = AlertState::Fired;
                        evaluation.fired.push(FiredAlert {
                            hazard: hazard.clone(),
                            distance,
                        });
                    } else {
                        evaluation.suppressed.push(hazard.id.clone());
                    }
                }
                AlertState::Fired if distance.value() > reset => {
                    *state = AlertState::Armed;
                    evaluation.rearmed.push(hazard.id.clone());
                }
                _ => {}
            }
        }

        evaluation
    }

    /// Drop states for hazards absent from `hazards`.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self, hazards: &[Hazard]) -> usize {
        let present: HashSet<&HazardId> = hazards.iter().map(|h| &h.id).collect();
        let before = self.states.len();
        self.states.retain(|id, _| present.contains(id));
        before - self.states.len()
    }
}
