//! Haversine great-circle distance.
//!
//! See [Wikipedia](https://en.wikipedia.org/wiki/Haversine_formula) for
//! more. Earth is treated as a sphere of mean radius 6371 km, which is
//! accurate to within about 0.5% anywhere on the surface.

use crate::domain::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance between two coordinates along the surface, in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let d_lat = (to.latitude() - from.latitude()).to_radians();
    let d_lon = (to.longitude() - from.longitude()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_km(c(31.95, 35.91), c(31.95, 35.91)), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        assert_close(haversine_km(c(0.0, 0.0), c(0.0, 1.0)), 111.195, 0.001);
    }

    #[test]
    fn amman_pair() {
        assert_close(haversine_km(c(31.95, 35.91), c(32.00, 35.95)), 6.719, 0.001);
    }

    #[test]
    fn london_to_paris() {
        assert_close(
            haversine_km(c(51.5074, -0.1278), c(48.8566, 2.3522)),
            343.556,
            0.01,
        );
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert_close(haversine_km(c(0.0, 0.0), c(0.0, 180.0)), half, 1e-6);
        assert_close(haversine_km(c(90.0, 0.0), c(-90.0, 0.0)), half, 1e-6);
    }

    #[test]
    fn crossing_the_antimeridian() {
        // 179.5E to 179.5W is one degree apart, not 359.
        assert_close(
            haversine_km(c(0.0, 179.5), c(0.0, -179.5)),
            111.195,
            0.001,
        );
    }
}
