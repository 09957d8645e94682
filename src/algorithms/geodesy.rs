//! Great-circle helpers on a spherical Earth
//!
//! All angles are in degrees. Bearings are measured clockwise from true
//! north and normalized to [0, 360); signed angle differences are
//! normalized to (-180, 180].

use crate::core::{Coordinate, EARTH_RADIUS_M};

/// Haversine distance between two coordinates (meters)
pub fn distance_meters<A, B>(a: &A, b: &B) -> f64
where
    A: Coordinate + ?Sized,
    B: Coordinate + ?Sized,
{
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let d_phi = (b.latitude() - a.latitude()).to_radians();
    let d_lambda = (b.longitude() - a.longitude()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` to `to`
///
/// A zero-length segment has bearing 0.
pub fn bearing_degrees<A, B>(from: &A, to: &B) -> f64
where
    A: Coordinate + ?Sized,
    B: Coordinate + ?Sized,
{
    let phi1 = from.latitude().to_radians();
    let phi2 = to.latitude().to_radians();
    let d_lambda = (to.longitude() - from.longitude()).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wrap any angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed rotation that takes `b` onto `a`, in (-180, 180]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Point reached by travelling `distance_m` along `bearing_deg` from `from`
///
/// Returns `(latitude, longitude)`.
pub fn destination_point<A>(from: &A, bearing_deg: f64, distance_m: f64) -> (f64, f64)
where
    A: Coordinate + ?Sized,
{
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = from.latitude().to_radians();
    let lambda1 = from.longitude().to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let longitude = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (phi2.to_degrees(), longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance_zero_for_same_point() {
        assert_eq!(distance_meters(&(0.0, 0.0), &(0.0, 0.0)), 0.0);
        assert_eq!(distance_meters(&(47.6, -122.3), &(47.6, -122.3)), 0.0);
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = distance_meters(&(0.0, 0.0), &(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 111_195.0 * 0.01, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (51.5007, -0.1246);
        let b = (48.8584, 2.2945);
        assert_abs_diff_eq!(distance_meters(&a, &b), distance_meters(&b, &a), epsilon = 1e-6);
    }

    #[test]
    fn test_bearing_due_east() {
        assert_abs_diff_eq!(bearing_degrees(&(0.0, 0.0), &(0.0, 1.0)), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert_abs_diff_eq!(bearing_degrees(&(0.0, 0.0), &(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bearing_degrees(&(0.0, 0.0), &(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bearing_degrees(&(0.0, 0.0), &(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_reversal_is_roughly_opposite() {
        let a = (40.0, -74.0);
        let b = (40.01, -73.99);
        let forward = bearing_degrees(&a, &b);
        let back = bearing_degrees(&b, &a);
        assert!((angle_difference(back, forward).abs() - 180.0).abs() < 0.1);
    }

    #[test]
    fn test_bearing_of_zero_length_segment() {
        assert_eq!(bearing_degrees(&(10.0, 10.0), &(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_angle_difference_range() {
        let mut a = -720.0;
        while a <= 720.0 {
            let mut b = -720.0;
            while b <= 720.0 {
                let d = angle_difference(a, b);
                assert!(d > -180.0 && d <= 180.0, "angle_difference({}, {}) = {}", a, b, d);
                b += 37.5;
            }
            assert_eq!(angle_difference(a, a), 0.0);
            a += 22.5;
        }
    }

    #[test]
    fn test_angle_difference_wraps() {
        assert_abs_diff_eq!(angle_difference(10.0, 350.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_difference(350.0, 10.0), -20.0, epsilon = 1e-9);
        assert_eq!(angle_difference(180.0, 0.0), 180.0);
        assert_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_abs_diff_eq!(angle_difference(0.0, 90.0), -90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_destination_point_matches_distance_and_bearing() {
        let start = (37.7749, -122.4194);
        let (lat, lon) = destination_point(&start, 45.0, 250.0);
        assert_abs_diff_eq!(distance_meters(&start, &(lat, lon)), 250.0, epsilon = 1e-3);
        assert_abs_diff_eq!(bearing_degrees(&start, &(lat, lon)), 45.0, epsilon = 0.01);
    }
}
