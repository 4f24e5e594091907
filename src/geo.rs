//! Great-circle geometry primitives.
//!
//! Ported from the Haversine/bearing/slerp formulas used throughout the
//! original maritime calculation service, expressed in idiomatic Rust.

use crate::model::Coordinates;

/// Earth's radius in nautical miles, calibrated for maritime navigation
/// (more precise than the commonly quoted 3440.065nm).
pub const EARTH_RADIUS_NM: f64 = 3440.0647948;

/// Maximum physically possible great-circle distance on Earth, used only
/// as a sanity bound for the diagnostic in `great_circle_distance_nm`.
const MAX_PLAUSIBLE_DISTANCE_NM: f64 = 21_600.0;

/// Great-circle distance between two coordinates, in nautical miles,
/// rounded to 0.01nm. Coincident points return exactly 0.
///
/// Distances outside `[0, 21600]` are implausible for any pair of points
/// on Earth; such a result is still returned (callers decide what to do)
/// but is logged as a diagnostic.
pub fn great_circle_distance_nm(origin: Coordinates, destination: Coordinates) -> f64 {
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let lon2 = destination.longitude.to_radians();

    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;

    let haversine_a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let central_angle = 2.0 * haversine_a.sqrt().atan2((1.0 - haversine_a).sqrt());
    let distance_nm = EARTH_RADIUS_NM * central_angle;

    if !(0.0..=MAX_PLAUSIBLE_DISTANCE_NM).contains(&distance_nm) {
        tracing::warn!(
            origin = ?origin,
            destination = ?destination,
            distance_nm,
            "suspicious great-circle distance calculation"
        );
    }

    round_to(distance_nm, 2)
}

/// Initial compass bearing from `origin` to `destination`, in degrees
/// `[0, 360)`. Coincident points (zero delta in both axes) return 0.
pub fn initial_bearing_deg(origin: Coordinates, destination: Coordinates) -> f64 {
    let lat1 = origin.latitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let delta_lon = (destination.longitude - origin.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    if y == 0.0 && x == 0.0 {
        return 0.0;
    }

    let bearing_deg = y.atan2(x).to_degrees();
    (bearing_deg + 360.0) % 360.0
}

/// Point along the great-circle arc from `origin` to `destination` at
/// fraction `f` via spherical linear interpolation. `f=0` returns
/// `origin` exactly, `f=1` returns `destination` exactly.
pub fn intermediate_point(origin: Coordinates, destination: Coordinates, f: f64) -> Coordinates {
    debug_assert!((0.0..=1.0).contains(&f), "fraction must be within [0, 1]");

    if f <= 0.0 {
        return origin;
    }
    if f >= 1.0 {
        return destination;
    }

    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let lon2 = destination.longitude.to_radians();

    let distance_nm = great_circle_distance_nm(origin, destination);
    let delta = distance_nm / EARTH_RADIUS_NM;

    if delta == 0.0 {
        return origin;
    }

    let a = ((1.0 - f) * delta).sin() / delta.sin();
    let b = (f * delta).sin() / delta.sin();

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    let lat_result = z.atan2((x * x + y * y).sqrt());
    let lon_result = y.atan2(x);

    Coordinates {
        latitude: lat_result.to_degrees(),
        longitude: lon_result.to_degrees(),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinates {
        Coordinates { latitude: lat, longitude: lon }
    }

    #[test]
    fn distance_of_coincident_points_is_zero() {
        let p = coord(1.3521, 103.8198);
        assert_eq!(great_circle_distance_nm(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let sgsin = coord(1.2655, 103.8201);
        let nlrtm = coord(51.9496, 4.1453);
        let a_to_b = great_circle_distance_nm(sgsin, nlrtm);
        let b_to_a = great_circle_distance_nm(nlrtm, sgsin);
        assert!((a_to_b - b_to_a).abs() < 0.01);
    }

    #[test]
    fn distance_satisfies_triangle_inequality() {
        let p = coord(1.2655, 103.8201);
        let q = coord(51.9496, 4.1453);
        let r = coord(31.2304, 121.4737);

        let pr = great_circle_distance_nm(p, r);
        let pq = great_circle_distance_nm(p, q);
        let qr = great_circle_distance_nm(q, r);

        assert!(pr <= pq + qr + 0.01);
    }

    #[test]
    fn bearing_is_within_range() {
        let sgsin = coord(1.2655, 103.8201);
        let nlrtm = coord(51.9496, 4.1453);
        let bearing = initial_bearing_deg(sgsin, nlrtm);
        assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn bearing_of_coincident_points_is_zero() {
        let p = coord(10.0, 10.0);
        assert_eq!(initial_bearing_deg(p, p), 0.0);
    }

    #[test]
    fn midpoint_endpoints_are_exact() {
        let sgsin = coord(1.2655, 103.8201);
        let nlrtm = coord(51.9496, 4.1453);

        let at_zero = intermediate_point(sgsin, nlrtm, 0.0);
        let at_one = intermediate_point(sgsin, nlrtm, 1.0);

        assert_eq!(at_zero.latitude, sgsin.latitude);
        assert_eq!(at_zero.longitude, sgsin.longitude);
        assert_eq!(at_one.latitude, nlrtm.latitude);
        assert_eq!(at_one.longitude, nlrtm.longitude);
    }

    #[test]
    fn sgsin_to_nlrtm_is_roughly_eight_thousand_nm() {
        let sgsin = coord(1.2655, 103.8201);
        let nlrtm = coord(51.9496, 4.1453);
        let distance = great_circle_distance_nm(sgsin, nlrtm);
        assert!((7500.0..9000.0).contains(&distance), "got {distance}");
    }
}
