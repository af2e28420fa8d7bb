//! Dispatch cooldown gate.
//!
//! # State Machine
//!
//! ```text
//! Open --[try_acquire]--> Busy (until acquired_at + cooldown)
//! Busy --[cooldown elapsed]--> Open
//! Busy --[try_acquire]--> Busy (refused)
//! ```
//!
//! The gate reopens on time alone. Whether the dispatch that took it
//! succeeded, failed or is still speaking does not matter, so a failing
//! speech engine can never block later alerts.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Deadline used when `now + cooldown` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Proof that the gate was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTicket {
    /// When the gate was taken.
    pub acquired_at: Instant,
    /// When the gate reopens.
    pub reopens_at: Instant,
}

/// Allows at most one alert dispatch per cooldown window.
#[derive(Debug, Default)]
pub struct DispatchGate {
    busy_until: Mutex<Option<Instant>>,
}

impl DispatchGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate for `cooldown`, or `None` if a previous dispatch is
    /// still inside its window.
    pub fn try_acquire(&self, cooldown: Duration) -> Option<DispatchTicket> {
        let now = Instant::now();
        let mut busy_until = self.busy_until.lock();

        if matches!(*busy_until, Some(until) if now < until) {
            return None;
        }

        let reopens_at = now
            .checked_add(cooldown)
            .unwrap_or_else(|| now + FAR_FUTURE);
        *busy_until = Some(reopens_at);
        Some(DispatchTicket {
            acquired_at: now,
            reopens_at,
        })
    }

    /// Whether a dispatch is currently inside its cooldown window.
    pub fn is_busy(&self) -> bool {
        self.remaining().is_some()
    }

    /// Time left until the gate reopens, if it is busy.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        match *self.busy_until.lock() {
            Some(until) if now < until => Some(until - now),
            _ => None,
        }
    }
}
