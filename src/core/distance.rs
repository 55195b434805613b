use crate::models::Location;

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the Haversine distance between two points in meters
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// Inputs are not range-checked.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance in meters between two locations
#[inline]
pub fn distance_between(from: &Location, to: &Location) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance(0.0, 0.0, 0.0, 0.0), 0.0);

        let d = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060);
        assert!(d.abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_new_york_to_london() {
        let d = haversine_distance(40.7128, -74.0060, 51.5074, -0.1278);
        let expected = 5_570_000.0;
        assert!(
            (d - expected).abs() < expected * 0.01,
            "Distance should be ~5570km, got {}m",
            d
        );
    }

    #[test]
    fn test_london_to_paris() {
        let d = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 344_000.0).abs() < 10_000.0, "Distance should be ~344km, got {}m", d);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ((40.7128, -74.0060), (51.5074, -0.1278)),
            ((-33.8688, 151.2093), (35.6762, 139.6503)),
            ((89.9, 0.0), (-89.9, 180.0)),
        ];

        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let there = haversine_distance(lat1, lon1, lat2, lon2);
            let back = haversine_distance(lat2, lon2, lat1, lon1);
            assert!((there - back).abs() < 1e-6, "{} != {}", there, back);
        }
    }

    #[test]
    fn test_antipodal_points_half_circumference() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half).abs() < 1.0);
        assert!(!d.is_nan());
    }

    #[test]
    fn test_distance_between_locations() {
        let a = Location::new(40.7128, -74.0060);
        let b = Location::new(40.72, -74.01);
        let d = distance_between(&a, &b);
        assert!(d > 0.0 && d < 2_000.0, "Expected ~1km, got {}m", d);
    }
}
