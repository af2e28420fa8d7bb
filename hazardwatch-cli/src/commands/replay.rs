//! Replay command - drive the engine along a recorded route.
//!
//! Hazards are read in the same JSON shape the hazard feed serves. The route
//! is a JSON array of points:
//!
//! ```json
//! [ { "latitude": 24.7095, "longitude": 46.6760 },
//!   { "lat": 24.7136, "lng": 46.6753, "timestamp": "2025-01-01T08:00:00Z" } ]
//! ```
//!
//! Points are delivered through a `ManualPositionSource`, one check at a
//! time, `interval` apart in wall-clock time. Alerts are printed to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;

use hazardwatch::alert::{AlertCatalog, AlertDispatcher, DispatchError, SpeechOptions};
use hazardwatch::geo::Meters;
use hazardwatch::hazard::{decode_feed, Hazard, HazardCategory, HazardId, StaticHazardRepository};
use hazardwatch::position::{ManualPositionSource, Position, WatchOptions};
use hazardwatch::proximity::{EngineCollaborators, EngineStatsSnapshot, ProximityEngine};
use hazardwatch::settings::{ConfigFile, EngineConfig, InMemorySettingsStore};
use hazardwatch::BoxFuture;

use crate::error::CliError;

/// Arguments for the replay command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Hazard list (JSON array or `{"hazards": [...]}`)
    #[arg(long)]
    pub hazards: PathBuf,

    /// Route to replay (JSON array of points)
    #[arg(long)]
    pub route: PathBuf,

    /// Configuration file (defaults built in when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Delay between route points in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

/// A single route point.
#[derive(Debug, Clone, Deserialize)]
struct RoutePoint {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    longitude: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Totals printed after a replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub points: usize,
    pub hazards_visible: usize,
    pub stats: EngineStatsSnapshot,
}

/// Dispatcher that prints alerts to stdout.
#[derive(Debug, Default)]
struct ConsoleDispatcher;

impl AlertDispatcher for ConsoleDispatcher {
    fn speak(
        &self,
        message: String,
        options: SpeechOptions,
    ) -> BoxFuture<'_, Result<(), DispatchError>> {
        println!("  say [{} @ {:.0}%]: {}", options.language, options.volume * 100.0, message);
        Box::pin(async { Ok(()) })
    }

    fn present_alert(
        &self,
        hazard_id: HazardId,
        distance: Meters,
        category: HazardCategory,
    ) -> BoxFuture<'_, Result<(), DispatchError>> {
        println!("ALERT {} {} at {}", category, hazard_id, distance);
        Box::pin(async { Ok(()) })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| CliError::input(path, e))
}

/// Load the hazard list.
pub fn load_hazards(path: &Path) -> Result<Vec<Hazard>, CliError> {
    decode_feed(&read_file(path)?).map_err(|e| CliError::input(path, e))
}

/// Load the route, stamping points without a timestamp `interval` apart.
pub fn load_route(path: &Path, interval: Duration) -> Result<Vec<Position>, CliError> {
    let points: Vec<RoutePoint> =
        serde_json::from_slice(&read_file(path)?).map_err(|e| CliError::input(path, e))?;
    if points.is_empty() {
        return Err(CliError::input(path, "route has no points"));
    }

    let step = chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::zero());
    let start = Utc::now();
    Ok(points
        .into_iter()
        .zip(0..)
        .map(|(p, i)| {
            let at = p.timestamp.unwrap_or(start + step * i);
            Position::at(p.latitude, p.longitude, at)
        })
        .collect())
}

/// Replay `route` against `hazards` with a live engine.
pub async fn replay(
    hazards: Vec<Hazard>,
    route: Vec<Position>,
    config: EngineConfig,
    catalog: AlertCatalog,
    interval: Duration,
) -> Result<ReplaySummary, CliError> {
    let source = Arc::new(ManualPositionSource::new());

    let engine = ProximityEngine::builder(EngineCollaborators {
        foreground: source.clone(),
        background: Arc::new(ManualPositionSource::new()),
        repository: Arc::new(StaticHazardRepository::new(hazards)),
        settings: Arc::new(InMemorySettingsStore::new(config)),
        dispatcher: Arc::new(ConsoleDispatcher),
    })
    .catalog(catalog)
    // Recorded routes are already sampled.
    .watch_options(WatchOptions::unfiltered(), WatchOptions::unfiltered())
    .build();

    if !engine.start().await {
        return Err(CliError::PermissionDenied);
    }

    for (i, pos) in route.iter().enumerate() {
        tracing::debug!(point = i, lat = pos.latitude, lon = pos.longitude, "Replaying point");
        source.deliver(*pos);
        while engine.is_checking() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        if i + 1 < route.len() {
            tokio::time::sleep(interval).await;
        }
    }

    // Let the last dispatch print.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let summary = ReplaySummary {
        points: route.len(),
        hazards_visible: engine.nearby_hazards().len(),
        stats: engine.stats(),
    };
    engine.stop();
    Ok(summary)
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let interval = Duration::from_millis(args.interval_ms);
    let hazards = load_hazards(&args.hazards)?;
    let route = load_route(&args.route, interval)?;

    let config_file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let catalog = match &config_file.catalog_path {
        Some(path) => AlertCatalog::load(path)?,
        None => AlertCatalog::builtin(),
    };

    println!(
        "Replaying {} points against {} hazards",
        route.len(),
        hazards.len()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let summary = runtime.block_on(replay(
        hazards,
        route,
        config_file.engine,
        catalog,
        interval,
    ))?;

    let s = &summary.stats;
    println!();
    println!("Points replayed:    {}", summary.points);
    println!("Checks completed:   {}", s.checks_completed);
    println!("Updates dropped:    {}", s.checks_dropped);
    println!("Alerts fired:       {}", s.alerts_fired);
    println!("Alerts held back:   {}", s.alerts_suppressed);
    println!("Dispatch failures:  {}", s.dispatch_failures);
    println!("Hazards in range:   {}", summary.hazards_visible);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_route_accepts_short_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "route.json",
            r#"[{"lat": 24.7095, "lng": 46.676}, {"latitude": 24.7136, "longitude": 46.6753}]"#,
        );

        let route = load_route(&path, Duration::from_secs(1)).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].latitude, 24.7095);
        assert_eq!(
            route[1].timestamp - route[0].timestamp,
            chrono::Duration::seconds(1)
        );
    }

    #[test]
    fn test_load_route_keeps_recorded_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "route.json",
            r#"[{"lat": 1.0, "lng": 2.0, "timestamp": "2025-01-01T08:00:00Z"}]"#,
        );

        let route = load_route(&path, Duration::from_secs(1)).unwrap();
        assert_eq!(route[0].timestamp.to_rfc3339(), "2025-01-01T08:00:00+00:00");
    }

    #[test]
    fn test_empty_route_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "route.json", "[]");
        assert!(matches!(
            load_route(&path, Duration::ZERO),
            Err(CliError::Input { .. })
        ));
    }

    #[test]
    fn test_missing_hazard_file() {
        let err = load_hazards(Path::new("/nonexistent/hazards.json")).unwrap_err();
        assert_eq!(err.exit_code(), 65);
    }

    #[tokio::test]
    async fn test_replay_fires_once_on_approach() {
        let hazards = vec![Hazard::new(
            "cam",
            HazardCategory::SpeedCamera,
            24.7140,
            46.6760,
        )];
        let route = vec![
            Position::new(24.7095, 46.6760),
            Position::new(24.7120, 46.6760),
            Position::new(24.7136, 46.6753),
            Position::new(24.7138, 46.6757),
        ];

        let summary = replay(
            hazards,
            route,
            EngineConfig::default().with_sound(false),
            AlertCatalog::builtin(),
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(summary.points, 4);
        assert_eq!(summary.stats.checks_completed, 4);
        assert_eq!(summary.stats.alerts_fired, 1);
        assert_eq!(summary.hazards_visible, 1);
    }
}
