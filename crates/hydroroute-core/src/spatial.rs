//! Geodesic distance primitives.

use crate::models::LatLng;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine angular distance between two points, in radians.
///
/// The sequencer only compares distances, so the Earth-radius scaling is
/// left to callers that need real lengths.
pub fn angular_distance(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance_m(a: LatLng, b: LatLng) -> f64 {
    EARTH_RADIUS_M * angular_distance(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance_m(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let busan = LatLng::new(35.1796, 129.0756);
        assert!(haversine_distance_m(busan, busan) < 0.001);
    }

    #[test]
    fn angular_distance_is_symmetric() {
        let a = LatLng::new(35.1796, 129.0756);
        let b = LatLng::new(37.5665, 126.9780);
        assert!((angular_distance(a, b) - angular_distance(b, a)).abs() < 1e-12);
    }

    #[test]
    fn angular_distance_orders_by_separation() {
        let origin = LatLng::new(0.0, 0.0);
        let near = LatLng::new(0.0, 1.0);
        let far = LatLng::new(0.0, 5.0);
        assert!(angular_distance(origin, near) < angular_distance(origin, far));
    }
}
