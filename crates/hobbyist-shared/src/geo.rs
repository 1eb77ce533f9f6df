//! Great-circle distance between two points, used by the nearby query.

use crate::types::GeoPoint;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default search radius for the nearby query, in metres.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 5_000.0;

/// Haversine distance between `a` and `b` in metres.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(longitude: f64, latitude: f64) -> GeoPoint {
        GeoPoint {
            longitude,
            latitude,
        }
    }

    #[test]
    fn test_same_point_is_zero() {
        let p = point(-118.2437, 34.0522);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // ~111.19 km per degree of longitude on the equator
        let d = haversine_distance_m(point(0.0, 0.0), point(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = point(-118.2437, 34.0522); // downtown LA
        let b = point(-118.4912, 34.0195); // Santa Monica
        assert_eq!(haversine_distance_m(a, b), haversine_distance_m(b, a));
        // the two are roughly 23 km apart
        let d = haversine_distance_m(a, b);
        assert!(d > 20_000.0 && d < 26_000.0, "got {d}");
    }
}
