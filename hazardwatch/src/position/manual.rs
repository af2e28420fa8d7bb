//! Push-style position source.
//!
//! `ManualPositionSource` is the adapter for platforms that push fixes to the
//! app (an OS background location callback) and for route replays. Whoever
//! owns the platform hook calls [`ManualPositionSource::deliver`]; the source
//! fans the fix out to every live watch through that watch's filter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Position, PositionCallback, PositionSource, Subscription, UpdateFilter, WatchOptions};
use crate::BoxFuture;

struct Watcher {
    callback: PositionCallback,
    filter: UpdateFilter,
    token: CancellationToken,
}

/// Position source fed explicitly by its owner.
pub struct ManualPositionSource {
    permission_granted: AtomicBool,
    watchers: Mutex<Vec<Watcher>>,
    watch_calls: AtomicU64,
}

impl std::fmt::Debug for ManualPositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualPositionSource")
            .field("permission_granted", &self.permission_granted)
            .field("active_subscriptions", &self.active_subscriptions())
            .finish_non_exhaustive()
    }
}

impl Default for ManualPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualPositionSource {
    /// Create a source that grants permission.
    pub fn new() -> Self {
        Self {
            permission_granted: AtomicBool::new(true),
            watchers: Mutex::new(Vec::new()),
            watch_calls: AtomicU64::new(0),
        }
    }

    /// Create a source whose permission request is denied.
    pub fn denied() -> Self {
        let source = Self::new();
        source.set_permission(false);
        source
    }

    /// Change the answer given to permission requests.
    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }

    /// Deliver a fix to every live watch.
    ///
    /// Returns the number of callbacks invoked.
    pub fn deliver(&self, pos: Position) -> usize {
        // Collect under the lock, invoke outside it so callbacks may re-enter.
        let callbacks: Vec<PositionCallback> = {
            let mut watchers = self.watchers.lock();
            watchers.retain(|w| !w.token.is_cancelled());
            watchers
                .iter_mut()
                .filter_map(|w| w.filter.accept(&pos).then(|| w.callback.clone()))
                .collect()
        };

        for callback in &callbacks {
            callback(pos);
        }
        callbacks.len()
    }

    /// Number of watches that have not been cancelled.
    pub fn active_subscriptions(&self) -> usize {
        self.watchers
            .lock()
            .iter()
            .filter(|w| !w.token.is_cancelled())
            .count()
    }

    /// Total number of `watch` calls ever made on this source.
    pub fn watch_calls(&self) -> u64 {
        self.watch_calls.load(Ordering::SeqCst)
    }
}

impl PositionSource for ManualPositionSource {
    fn request_permissions(&self) -> BoxFuture<'_, bool> {
        let granted = self.permission_granted.load(Ordering::SeqCst);
        Box::pin(async move { granted })
    }

    fn watch(&self, on_update: PositionCallback, options: WatchOptions) -> Subscription {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        self.watchers.lock().push(Watcher {
            callback: on_update,
            filter: UpdateFilter::new(&options),
            token: token.clone(),
        });
        Subscription::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_callback() -> (PositionCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let callback: PositionCallback = Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    #[test]
    fn test_deliver_reaches_all_watchers() {
        let source = ManualPositionSource::new();
        let (cb1, count1) = counting_callback();
        let (cb2, count2) = counting_callback();
        let _s1 = source.watch(cb1, WatchOptions::unfiltered());
        let _s2 = source.watch(cb2, WatchOptions::unfiltered());

        assert_eq!(source.deliver(Position::new(24.0, 46.0)), 2);
        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_watch_stops_receiving() {
        let source = ManualPositionSource::new();
        let (cb, count) = counting_callback();
        let sub = source.watch(cb, WatchOptions::unfiltered());
        source.deliver(Position::new(24.0, 46.0));

        sub.cancel();
        assert_eq!(source.active_subscriptions(), 0);
        assert_eq!(source.deliver(Position::new(24.0, 46.0)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_filter_is_applied() {
        let source = ManualPositionSource::new();
        let (cb, count) = counting_callback();
        let _sub = source.watch(cb, WatchOptions::background());

        source.deliver(Position::new(24.0, 46.0));
        source.deliver(Position::new(24.0, 46.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permission_answer() {
        let source = ManualPositionSource::denied();
        assert!(!source.request_permissions().await);
        source.set_permission(true);
        assert!(source.request_permissions().await);
    }
}
