//! Distance/interval filtering for position watches.

use chrono::{DateTime, Utc};

use super::{Position, WatchOptions};
use crate::geo::{self, Coordinate};

/// Applies a watch's `min_distance_m` and `min_interval` to incoming fixes.
///
/// The first valid fix always passes. After that a fix passes only once it is
/// both far enough and late enough relative to the last one that passed.
/// Fixes with invalid coordinates never pass.
#[derive(Debug, Clone)]
pub struct UpdateFilter {
    min_distance_m: f64,
    min_interval: chrono::Duration,
    last: Option<(Coordinate, DateTime<Utc>)>,
}

impl UpdateFilter {
    /// Create a filter for the given watch options.
    pub fn new(options: &WatchOptions) -> Self {
        Self {
            min_distance_m: options.min_distance_m,
            min_interval: chrono::Duration::from_std(options.min_interval)
                .unwrap_or(chrono::Duration::MAX),
            last: None,
        }
    }

    /// Decide whether `pos` should be delivered, recording it if so.
    pub fn accept(&mut self, pos: &Position) -> bool {
        let Ok(coord) = pos.coordinate() else {
            tracing::debug!(
                lat = pos.latitude,
                lon = pos.longitude,
                "Dropping position with invalid coordinate"
            );
            return false;
        };

        if let Some((last_coord, last_time)) = self.last {
            let elapsed = pos.timestamp - last_time;
            if elapsed < self.min_interval {
                return false;
            }
            let moved = geo::distance_between(&last_coord, &coord);
            if moved.value() < self.min_distance_m {
                return false;
            }
        }

        self.last = Some((coord, pos.timestamp));
        true
    }

    /// Forget the last delivered fix.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn at(lat: f64, lon: f64, secs: i64) -> Position {
        let t = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        Position::at(lat, lon, t)
    }

    fn options(min_distance_m: f64, secs: u64) -> WatchOptions {
        WatchOptions {
            min_distance_m,
            min_interval: Duration::from_secs(secs),
            ..WatchOptions::unfiltered()
        }
    }

    #[test]
    fn test_first_fix_passes() {
        let mut filter = UpdateFilter::new(&options(50.0, 10));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
    }

    #[test]
    fn test_too_soon_is_dropped() {
        let mut filter = UpdateFilter::new(&options(0.0, 10));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
        assert!(!filter.accept(&at(24.1, 46.0, 5)));
        assert!(filter.accept(&at(24.1, 46.0, 10)));
    }

    #[test]
    fn test_too_close_is_dropped() {
        let mut filter = UpdateFilter::new(&options(50.0, 0));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
        // ~11 m north
        assert!(!filter.accept(&at(24.0001, 46.0, 1)));
        // ~111 m north
        assert!(filter.accept(&at(24.001, 46.0, 2)));
    }

    #[test]
    fn test_invalid_coordinate_never_passes() {
        let mut filter = UpdateFilter::new(&WatchOptions::unfiltered());
        assert!(!filter.accept(&at(f64::NAN, 46.0, 0)));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
    }

    #[test]
    fn test_unfiltered_passes_duplicates() {
        let mut filter = UpdateFilter::new(&WatchOptions::unfiltered());
        assert!(filter.accept(&at(24.0, 46.0, 0)));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
    }

    #[test]
    fn test_reset_lets_next_fix_through() {
        let mut filter = UpdateFilter::new(&options(1000.0, 60));
        assert!(filter.accept(&at(24.0, 46.0, 0)));
        assert!(!filter.accept(&at(24.0, 46.0, 1)));
        filter.reset();
        assert!(filter.accept(&at(24.0, 46.0, 2)));
    }
}
