//! Pull-style position source.
//!
//! Foreground location on most platforms is a "current fix" query rather than
//! a push stream. `PollingPositionSource` turns such a query into a watch: a
//! tokio task polls the [`PositionReader`] every `min_interval` and forwards
//! fixes that pass the watch filter until the subscription is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Position, PositionCallback, PositionSource, Subscription, UpdateFilter, WatchOptions};
use crate::BoxFuture;

/// Lower bound on the poll period so a zero interval does not spin.
const MIN_POLL_PERIOD: Duration = Duration::from_millis(100);

/// Platform hook that answers "where is the device now?".
pub trait PositionReader: Send + Sync {
    /// Current fix, or `None` if no fix is available right now.
    fn current_position(&self) -> BoxFuture<'_, Option<Position>>;

    /// Ask for location permission. Granted by default.
    fn request_permissions(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}

/// Position source that polls a [`PositionReader`] on a timer.
pub struct PollingPositionSource {
    reader: Arc<dyn PositionReader>,
}

impl PollingPositionSource {
    /// Create a polling source around a reader.
    pub fn new(reader: Arc<dyn PositionReader>) -> Self {
        Self { reader }
    }
}

impl PositionSource for PollingPositionSource {
    fn request_permissions(&self) -> BoxFuture<'_, bool> {
        self.reader.request_permissions()
    }

    fn watch(&self, on_update: PositionCallback, options: WatchOptions) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Polling position watch requested outside a tokio runtime");
            return Subscription::closed();
        };

        let token = CancellationToken::new();
        let period = options.min_interval.max(MIN_POLL_PERIOD);
        runtime.spawn(poll_loop(
            Arc::clone(&self.reader),
            on_update,
            UpdateFilter::new(&options),
            period,
            token.clone(),
        ));

        Subscription::new(token)
    }
}

async fn poll_loop(
    reader: Arc<dyn PositionReader>,
    on_update: PositionCallback,
    mut filter: UpdateFilter,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fix = tokio::select! {
            _ = token.cancelled() => break,
            fix = reader.current_position() => fix,
        };

        match fix {
            Some(pos) if filter.accept(&pos) => on_update(pos),
            Some(_) => {}
            None => tracing::trace!("No position fix available"),
        }
    }

    tracing::debug!("Polling position watch stopped");
}
