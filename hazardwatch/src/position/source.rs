//! Position source abstraction.
//!
//! The engine never talks to a platform location API directly. It depends on
//! [`PositionSource`], which platform adapters implement (a foreground watcher
//! that polls the GPS, an OS background callback, a route replay, a test
//! double). Two independent instances feed the same engine.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::Position;
use crate::BoxFuture;

/// Callback invoked for every position update that passes a watch's filter.
pub type PositionCallback = Arc<dyn Fn(Position) + Send + Sync>;

/// Requested fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    /// GPS-grade fixes, highest battery cost.
    High,
    /// Network/GPS mix suitable for background tracking.
    Balanced,
    /// Coarse cell/wifi fixes.
    Low,
}

/// Options for a position watch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Requested fix quality.
    pub accuracy: Accuracy,
    /// Minimum movement between two delivered updates.
    pub min_distance_m: f64,
    /// Minimum time between two delivered updates.
    pub min_interval: Duration,
}

impl WatchOptions {
    /// Fine-grained watcher used while the app is in the foreground.
    pub fn foreground() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_distance_m: 10.0,
            min_interval: Duration::from_secs(1),
        }
    }

    /// Coarser watcher registered with the OS for background delivery.
    pub fn background() -> Self {
        Self {
            accuracy: Accuracy::Balanced,
            min_distance_m: 50.0,
            min_interval: Duration::from_secs(10),
        }
    }

    /// Deliver every update (useful for replays and tests).
    pub fn unfiltered() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_distance_m: 0.0,
            min_interval: Duration::ZERO,
        }
    }
}

/// Handle to an active position watch.
///
/// Cancelling (explicitly or by dropping the handle) stops further callback
/// deliveries. Adapters observe the shared [`CancellationToken`].
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    /// Create a subscription around a cancellation token.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A subscription that is already cancelled (watch could not be set up).
    pub fn closed() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    /// Stop deliveries.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether deliveries have been stopped.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Clone of the underlying token, for adapters.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// A stream of device positions.
///
/// # Implementors
///
/// - `ManualPositionSource` - push-style: OS callbacks or replays call `deliver`
/// - `PollingPositionSource` - pull-style: polls a `PositionReader` on a timer
pub trait PositionSource: Send + Sync {
    /// Ask the platform for location permission.
    ///
    /// Returns `false` if the user denied access.
    fn request_permissions(&self) -> BoxFuture<'_, bool>;

    /// Register a callback for position updates.
    ///
    /// The callback keeps firing until the returned [`Subscription`] is
    /// cancelled or dropped.
    fn watch(&self, on_update: PositionCallback, options: WatchOptions) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let fg = WatchOptions::foreground();
        let bg = WatchOptions::background();
        assert!(fg.min_distance_m < bg.min_distance_m);
        assert!(fg.min_interval < bg.min_interval);
        assert_eq!(fg.accuracy, Accuracy::High);
    }

    #[test]
    fn test_subscription_cancel_on_drop() {
        let token = CancellationToken::new();
        let sub = Subscription::new(token.clone());
        assert!(!sub.is_cancelled());
        drop(sub);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_closed_subscription() {
        assert!(Subscription::closed().is_cancelled());
    }
}
