//! Single-flight token.
//!
//! At most one holder at a time; callers that find the token taken are
//! turned away rather than queued. The permit releases the token on drop, so
//! an early return or a panic inside the guarded section cannot leave it
//! stuck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Drop-if-busy guard around an operation.
#[derive(Debug, Default, Clone)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

/// Exclusive right to run the guarded operation.
///
/// Owns its handle to the token, so it can move into a spawned task.
#[derive(Debug)]
#[must_use = "the token is released as soon as the permit is dropped"]
pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    /// Create a free token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the token, or `None` if another holder has it.
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether the token is currently held.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
