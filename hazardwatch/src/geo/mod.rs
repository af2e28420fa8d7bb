//! Great-circle geometry.
//!
//! Provides the haversine distance between two coordinates on a spherical
//! earth. The function is pure and validates its inputs: invalid coordinates
//! are reported as [`GeoError::InvalidCoordinate`] instead of producing `NaN`.
//! Callers that want to tolerate bad data (e.g. a hazard feed entry with a
//! broken location) filter at their own layer.

mod types;

pub use types::{Coordinate, GeoError, Meters, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean earth radius in metres used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two latitude/longitude pairs.
///
/// Each pair is validated into a [`Coordinate`]; use [`distance_between`]
/// when the points are already coordinates.
///
/// # Arguments
///
/// * `a` - First point (latitude, longitude) in degrees
/// * `b` - Second point (latitude, longitude) in degrees
///
/// # Returns
///
/// The great-circle distance, or an error if either point is invalid.
#[inline]
pub fn distance(a: (f64, f64), b: (f64, f64)) -> Result<Meters, GeoError> {
    let a = Coordinate::new(a.0, a.1)?;
    let b = Coordinate::new(b.0, b.1)?;
    Ok(distance_between(&a, &b))
}

/// Haversine distance between two already-validated coordinates.
#[inline]
pub fn distance_between(a: &Coordinate, b: &Coordinate) -> Meters {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let dlat = (b.latitude() - a.latitude()).to_radians();
    let dlon = (b.longitude() - a.longitude()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1.0 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    Meters(EARTH_RADIUS_M * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_point_is_zero() {
        let d = distance((24.7136, 46.6753), (24.7136, 46.6753)).unwrap();
        assert_eq!(d.value(), 0.0);
    }

    #[test]
    fn test_pair_and_coordinate_forms_agree() {
        let a = Coordinate::new(24.7095, 46.6760).unwrap();
        let b = Coordinate::new(24.7136, 46.6753).unwrap();
        let d = distance((24.7095, 46.6760), (24.7136, 46.6753)).unwrap();
        assert_eq!(d, distance_between(&a, &b));
    }

    #[test]
    fn test_riyadh_short_hop() {
        // User approaching a reported hazard in Riyadh
        let d = distance((24.7136, 46.6753), (24.7140, 46.6760)).unwrap();
        assert!((d.value() - 83.5).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance((0.0, 0.0), (1.0, 0.0)).unwrap();
        assert!((d.value() - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_antipodal_points() {
        let d = distance((0.0, 0.0), (0.0, 180.0)).unwrap();
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d.value() - half_circumference).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_latitude_is_error() {
        let result = distance((91.0, 0.0), (0.0, 0.0));
        assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_nan_is_error() {
        assert!(distance((0.0, 0.0), (0.0, f64::NAN)).is_err());
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            lat1 in -90.0f64..=90.0,
            lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0,
        ) {
            let ab = distance((lat1, lon1), (lat2, lon2)).unwrap();
            let ba = distance((lat2, lon2), (lat1, lon1)).unwrap();
            prop_assert!((ab.value() - ba.value()).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_is_bounded(
            lat1 in -90.0f64..=90.0,
            lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0,
        ) {
            let d = distance((lat1, lon1), (lat2, lon2)).unwrap();
            prop_assert!(d.value() >= 0.0);
            prop_assert!(d.value() <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }
    }
}
