//! The proximity alerting engine.
//!
//! # Check Cycle
//!
//! ```text
//! position update
//!   └─ check token free? ──no──► drop update
//!        └─ fetch hazards near position (keeps old snapshot on failure)
//!             └─ HazardTracker::evaluate (hysteresis + category gating)
//!                  └─ DispatchGate open? ──► Fired + dispatch (fire-and-forget)
//!             └─ prune states of vanished hazards
//! ```
//!
//! # Thread Safety
//!
//! Position callbacks may arrive from both watchers at once and from any
//! thread. The check token is an atomic compare-and-swap; the snapshot and
//! alert states sit behind one `Mutex` that is never held across an
//! `.await`. Only the holder of the check token mutates the alert states.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;

use super::single_flight::{FlightPermit, SingleFlight};
use super::state::{AlertState, HazardTracker};
use super::stats::{EngineStats, EngineStatsSnapshot};
use crate::alert::{AlertCatalog, AlertDispatcher, DispatchGate, SpeechOptions};
use crate::geo::Meters;
use crate::hazard::{Hazard, HazardId, HazardRepository};
use crate::position::{Position, PositionCallback, PositionSource, Subscription, WatchOptions};
use crate::settings::{EngineConfig, EngineConfigPatch, SettingsStore};

/// External collaborators injected into the engine.
#[derive(Clone)]
pub struct EngineCollaborators {
    /// Fine-grained watcher used while the app is visible.
    pub foreground: Arc<dyn PositionSource>,
    /// Coarse watcher delivered by the OS in the background.
    pub background: Arc<dyn PositionSource>,
    /// Source of hazards near a point.
    pub repository: Arc<dyn HazardRepository>,
    /// User preferences.
    pub settings: Arc<dyn SettingsStore>,
    /// Speech and alert-screen presentation.
    pub dispatcher: Arc<dyn AlertDispatcher>,
}

/// What happened to a position update.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// A check was already running; the update was dropped.
    Dropped,
    /// Monitoring is not active, or stopped while the check was running.
    Inactive,
    /// The position itself had invalid coordinates.
    InvalidPosition,
    /// The check ran.
    Completed(CheckReport),
}

impl CheckOutcome {
    /// Hazards that fired during this check.
    pub fn fired(&self) -> &[HazardId] {
        match self {
            CheckOutcome::Completed(report) => &report.fired,
            _ => &[],
        }
    }
}

/// Summary of a completed check cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// Whether the hazard fetch succeeded.
    pub fetch_ok: bool,
    /// Hazards in the snapshot the check evaluated.
    pub hazards: usize,
    /// Hazards that fired.
    pub fired: Vec<HazardId>,
    /// Hazards that re-armed.
    pub rearmed: Vec<HazardId>,
    /// Hazards refused by the cooldown gate.
    pub suppressed: Vec<HazardId>,
    /// Alert states dropped because their hazard vanished.
    pub pruned: usize,
}

/// Per-session runtime state, reset by `start()` and `stop()`.
#[derive(Default)]
struct Session {
    snapshot: Vec<Hazard>,
    tracker: HazardTracker,
    subscriptions: Vec<Subscription>,
}

struct EngineInner {
    foreground: Arc<dyn PositionSource>,
    background: Arc<dyn PositionSource>,
    repository: Arc<dyn HazardRepository>,
    settings: Arc<dyn SettingsStore>,
    dispatcher: Arc<dyn AlertDispatcher>,
    catalog: AlertCatalog,
    foreground_watch: WatchOptions,
    background_watch: WatchOptions,

    config: RwLock<EngineConfig>,
    /// Every patch applied through `update_settings`, re-applied on `start()`.
    overrides: Mutex<EngineConfigPatch>,

    active: AtomicBool,
    /// Bumped by `start()` and `stop()` so checks can tell they outlived
    /// their session.
    session_id: AtomicU64,
    check_flight: SingleFlight,
    dispatch_gate: DispatchGate,
    session: Mutex<Session>,
    lifecycle: tokio::sync::Mutex<()>,
    stats: Arc<EngineStats>,
}

/// Builder for [`ProximityEngine`].
pub struct EngineBuilder {
    collaborators: EngineCollaborators,
    catalog: AlertCatalog,
    foreground_watch: WatchOptions,
    background_watch: WatchOptions,
}

impl EngineBuilder {
    /// Replace the built-in message catalog.
    pub fn catalog(mut self, catalog: AlertCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Override the watch options used for the two position channels.
    pub fn watch_options(mut self, foreground: WatchOptions, background: WatchOptions) -> Self {
        self.foreground_watch = foreground;
        self.background_watch = background;
        self
    }

    /// Build the engine. Monitoring starts with [`ProximityEngine::start`].
    pub fn build(self) -> ProximityEngine {
        let c = self.collaborators;
        let config = c.settings.get();

        ProximityEngine {
            inner: Arc::new(EngineInner {
                foreground: c.foreground,
                background: c.background,
                repository: c.repository,
                settings: c.settings,
                dispatcher: c.dispatcher,
                catalog: self.catalog,
                foreground_watch: self.foreground_watch,
                background_watch: self.background_watch,
                config: RwLock::new(config),
                overrides: Mutex::new(EngineConfigPatch::default()),
                active: AtomicBool::new(false),
                session_id: AtomicU64::new(0),
                check_flight: SingleFlight::new(),
                dispatch_gate: DispatchGate::new(),
                session: Mutex::new(Session::default()),
                lifecycle: tokio::sync::Mutex::new(()),
                stats: Arc::new(EngineStats::default()),
            }),
        }
    }
}

/// Watches the device position and alerts on approaching hazards.
///
/// Cloning yields another handle to the same engine.
///
/// # Example
///
/// ```ignore
/// let engine = ProximityEngine::new(EngineCollaborators {
///     foreground, background, repository, settings, dispatcher,
/// });
///
/// if !engine.start().await {
///     // location permission denied
/// }
/// engine.update_settings(EngineConfigPatch::new().category(HazardCategory::SpeedCamera, false));
/// let visible = engine.nearby_hazards();
/// engine.stop();
/// ```
#[derive(Clone)]
pub struct ProximityEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for ProximityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityEngine")
            .field("active", &self.is_active())
            .field("config", &*self.inner.config.read())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ProximityEngine {
    /// Create an engine with the built-in catalog and default watch options.
    pub fn new(collaborators: EngineCollaborators) -> Self {
        Self::builder(collaborators).build()
    }

    /// Start building an engine.
    pub fn builder(collaborators: EngineCollaborators) -> EngineBuilder {
        EngineBuilder {
            collaborators,
            catalog: AlertCatalog::builtin(),
            foreground_watch: WatchOptions::foreground(),
            background_watch: WatchOptions::background(),
        }
    }

    /// Start monitoring.
    ///
    /// Idempotent: returns `true` without subscribing again if already
    /// active. Returns `false` if location permission is denied. If only the
    /// background permission is denied, monitoring runs on the foreground
    /// channel alone.
    pub async fn start(&self) -> bool {
        let inner = &self.inner;
        let _lifecycle = inner.lifecycle.lock().await;

        if inner.active.load(Ordering::SeqCst) {
            tracing::debug!("Hazard monitoring already active");
            return true;
        }
        // Any stop() from here on bumps the session and cancels this start.
        let session_at_entry = inner.session_id.load(Ordering::SeqCst);

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Hazard monitoring needs a tokio runtime");
                return false;
            }
        };

        if !inner.foreground.request_permissions().await {
            tracing::warn!("Location permission denied, hazard monitoring not started");
            return false;
        }
        let background_granted = inner.background.request_permissions().await;

        let mut config = inner.settings.get();
        config.apply(&inner.overrides.lock());
        *inner.config.write() = config;

        let callback = position_callback(Arc::downgrade(inner), runtime);
        let mut subscriptions = vec![inner
            .foreground
            .watch(Arc::clone(&callback), inner.foreground_watch.clone())];
        if background_granted {
            subscriptions.push(
                inner
                    .background
                    .watch(callback, inner.background_watch.clone()),
            );
        } else {
            tracing::warn!("Background location permission denied, monitoring in foreground only");
        }

        {
            let mut session = inner.session.lock();
            if inner.session_id.load(Ordering::SeqCst) != session_at_entry {
                drop(session);
                drop(subscriptions);
                tracing::info!("Hazard monitoring stopped while starting");
                return false;
            }
            session.snapshot.clear();
            session.tracker.clear();
            session.subscriptions = subscriptions;
            inner.session_id.fetch_add(1, Ordering::SeqCst);
            inner.active.store(true, Ordering::SeqCst);
        }

        tracing::info!(background = background_granted, "Hazard monitoring started");
        true
    }

    /// Stop monitoring.
    ///
    /// Cancels both position subscriptions and forgets the snapshot and every
    /// alert state. A dispatch already in flight is left to finish. A
    /// `start()` still waiting on permissions is cancelled and returns
    /// `false`.
    pub fn stop(&self) {
        let inner = &self.inner;
        let subscriptions = {
            let mut session = inner.session.lock();
            inner.session_id.fetch_add(1, Ordering::SeqCst);
            if !inner.active.swap(false, Ordering::SeqCst) {
                return;
            }
            session.snapshot.clear();
            session.tracker.clear();
            std::mem::take(&mut session.subscriptions)
        };
        for subscription in &subscriptions {
            subscription.cancel();
        }

        tracing::info!("Hazard monitoring stopped");
    }

    /// Whether monitoring is running.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Hazards from the last successful fetch, for display.
    ///
    /// Independent of alerting: hazards of disabled categories are listed.
    pub fn nearby_hazards(&self) -> Vec<Hazard> {
        self.inner.session.lock().snapshot.clone()
    }

    /// Merge a settings change; it takes effect on the next check cycle.
    pub fn update_settings(&self, patch: EngineConfigPatch) {
        self.inner.overrides.lock().merge(&patch);
        self.inner.config.write().apply(&patch);
        tracing::debug!(?patch, "Engine settings updated");
    }

    /// Current effective configuration.
    pub fn config(&self) -> EngineConfig {
        self.inner.config.read().clone()
    }

    /// Alert state of a hazard in the current session.
    pub fn alert_state(&self, id: &HazardId) -> AlertState {
        self.inner.session.lock().tracker.state(id)
    }

    /// Number of hazards with tracked alert state.
    pub fn tracked_hazards(&self) -> usize {
        self.inner.session.lock().tracker.len()
    }

    /// Whether a check cycle is running.
    pub fn is_checking(&self) -> bool {
        self.inner.check_flight.is_busy()
    }

    /// Whether an alert dispatch is inside its cooldown window.
    pub fn is_alert_in_flight(&self) -> bool {
        self.inner.dispatch_gate.is_busy()
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Handle a position update.
    ///
    /// This is the handler both position channels are subscribed to. It is
    /// public so hosts with their own position plumbing can drive the engine
    /// directly. Updates arriving while a check is running are dropped.
    pub async fn on_position(&self, pos: Position) -> CheckOutcome {
        match self.inner.check_flight.try_acquire() {
            Some(permit) => self.inner.run_check(permit, pos).await,
            None => {
                self.inner.stats.check_dropped();
                tracing::trace!("Check in flight, dropping position update");
                CheckOutcome::Dropped
            }
        }
    }
}

/// Callback shared by both position channels.
///
/// Holds the engine weakly so a dropped engine is not kept alive by its
/// position sources. The check token is taken before spawning, so updates
/// that would be dropped never reach the runtime.
fn position_callback(engine: Weak<EngineInner>, runtime: Handle) -> PositionCallback {
    Arc::new(move |pos: Position| {
        let Some(inner) = engine.upgrade() else {
            return;
        };
        let Some(permit) = inner.check_flight.try_acquire() else {
            inner.stats.check_dropped();
            tracing::trace!("Check in flight, dropping position update");
            return;
        };
        runtime.spawn(async move {
            inner.run_check(permit, pos).await;
        });
    })
}

impl EngineInner {
    async fn run_check(&self, _permit: FlightPermit, pos: Position) -> CheckOutcome {
        if !self.active.load(Ordering::SeqCst) {
            return CheckOutcome::Inactive;
        }
        let session_id = self.session_id.load(Ordering::SeqCst);

        let here = match pos.coordinate() {
            Ok(coord) => coord,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring position update");
                return CheckOutcome::InvalidPosition;
            }
        };

        let config = self.config.read().clone();
        let fetched = self
            .repository
            .fetch_nearby(pos, config.refresh_radius_m)
            .await;

        let fetch_ok = fetched.is_ok();
        if !fetch_ok {
            self.stats.fetch_failed();
        }

        let (evaluation, hazards, pruned) = {
            let mut guard = self.session.lock();
            if !self.active.load(Ordering::SeqCst)
                || self.session_id.load(Ordering::SeqCst) != session_id
            {
                tracing::debug!("Monitoring stopped during check, discarding result");
                return CheckOutcome::Inactive;
            }
            let session = &mut *guard;

            match fetched {
                Ok(hazards) => session.snapshot = hazards,
                Err(e) => tracing::warn!(
                    error = %e,
                    retained = session.snapshot.len(),
                    "Hazard fetch failed, keeping previous snapshot"
                ),
            }

            let gate = &self.dispatch_gate;
            let evaluation = session.tracker.evaluate(
                &here,
                &session.snapshot,
                &config,
                |hazard, distance| {
                    if gate.try_acquire(config.cooldown).is_some() {
                        return true;
                    }
                    tracing::debug!(
                        hazard = %hazard.id,
                        distance = %distance,
                        "Alert suppressed, previous alert still cooling down"
                    );
                    false
                },
            );

            let pruned = if fetch_ok {
                session.tracker.prune(&session.snapshot)
            } else {
                0
            };

            (evaluation, session.snapshot.len(), pruned)
        };

        self.stats.alerts_fired(evaluation.fired.len());
        self.stats.alerts_suppressed(evaluation.suppressed.len());
        for alert in &evaluation.fired {
            self.dispatch_alert(&alert.hazard, alert.distance, &config);
        }
        self.stats.check_completed();

        tracing::debug!(
            lat = pos.latitude,
            lon = pos.longitude,
            hazards,
            fired = evaluation.fired.len(),
            rearmed = evaluation.rearmed.len(),
            pruned,
            "Proximity check complete"
        );

        CheckOutcome::Completed(CheckReport {
            fetch_ok,
            hazards,
            fired: evaluation.fired.into_iter().map(|a| a.hazard.id).collect(),
            rearmed: evaluation.rearmed,
            suppressed: evaluation.suppressed,
            pruned,
        })
    }

    /// Present an alert without blocking the check cycle.
    ///
    /// Failures are logged and counted; the cooldown gate was already taken
    /// and reopens on its own.
    fn dispatch_alert(&self, hazard: &Hazard, distance: Meters, config: &EngineConfig) {
        tracing::info!(
            hazard = %hazard.id,
            category = %hazard.category,
            distance = %distance,
            "Hazard alert"
        );

        let speech = config.sound_enabled.then(|| {
            (
                self.catalog
                    .render(hazard.category, &config.language, distance),
                SpeechOptions {
                    language: config.language.clone(),
                    volume: config.volume,
                },
            )
        });
        let dispatcher = Arc::clone(&self.dispatcher);
        let stats = Arc::clone(&self.stats);
        let hazard_id = hazard.id.clone();
        let category = hazard.category;

        tokio::spawn(async move {
            if let Some((message, options)) = speech {
                if let Err(e) = dispatcher.speak(message, options).await {
                    stats.dispatch_failed();
                    tracing::warn!(hazard = %hazard_id, error = %e, "Alert speech failed");
                }
            }
            if let Err(e) = dispatcher
                .present_alert(hazard_id.clone(), distance, category)
                .await
            {
                stats.dispatch_failed();
                tracing::warn!(hazard = %hazard_id, error = %e, "Alert presentation failed");
            }
        });
    }
}
