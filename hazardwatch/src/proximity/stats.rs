//! Engine counters for diagnostics.
//!
//! Lock-free atomic counters updated by the check cycle, read as a
//! point-in-time [`EngineStatsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct EngineStats {
    checks_completed: AtomicU64,
    checks_dropped: AtomicU64,
    fetch_failures: AtomicU64,
    alerts_fired: AtomicU64,
    alerts_suppressed: AtomicU64,
    dispatch_failures: AtomicU64,
}

impl EngineStats {
    pub(crate) fn check_completed(&self) {
        self.checks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn check_dropped(&self) {
        self.checks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn alerts_fired(&self, n: usize) {
        self.alerts_fired.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn alerts_suppressed(&self, n: usize) {
        self.alerts_suppressed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn dispatch_failed(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            checks_completed: self.checks_completed.load(Ordering::Relaxed),
            checks_dropped: self.checks_dropped.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            alerts_fired: self.alerts_fired.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    /// Check cycles that ran to completion.
    pub checks_completed: u64,
    /// Position updates dropped because a check was already running.
    pub checks_dropped: u64,
    /// Hazard fetches that failed.
    pub fetch_failures: u64,
    /// Alerts dispatched.
    pub alerts_fired: u64,
    /// Eligible alerts refused by the cooldown gate.
    pub alerts_suppressed: u64,
    /// Speech or presentation calls that failed.
    pub dispatch_failures: u64,
}
