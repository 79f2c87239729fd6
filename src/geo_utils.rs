//! # Geographic Utilities
//!
//! Spherical geometry primitives used by every stage of track detection.
//!
//! All functions are pure and deterministic. They operate on WGS84 coordinates
//! (latitude/longitude in degrees) and treat the Earth as a sphere with the
//! mean radius used by [`geo::Haversine`].
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`point_to_line_distance`] | Distance from a point to a great-circle segment |
//! | [`bearing`] | Direction-agnostic bearing in radians, `[0, π]` |
//! | [`bearing_degrees`] | Signed initial bearing in degrees |
//! | [`angle_difference`] | Smallest unsigned angle between two bearings |
//! | [`midpoint`] | Great-circle midpoint |
//! | [`destination`] | Project a point along a bearing |
//! | [`polyline_length`] | Total length of a GPS track in meters |
//! | [`compute_bounds`] | Bounding box of a GPS track |
//! | [`unit_vector`] | Unit-sphere `[x, y, z]` of a GPS point |
//! | [`chord_length`] | Unit-sphere chord for a great-circle distance |
//!
//! ## Example
//!
//! ```rust
//! use track_finder::{GpsPoint, geo_utils};
//!
//! let start = GpsPoint::new(51.5074, -0.1278);
//! let end = geo_utils::destination(&start, 90.0, 100.0);
//!
//! let dist = geo_utils::haversine_distance(&start, &end);
//! assert!((dist - 100.0).abs() < 0.01);
//!
//! // East and west both map to the same axial bearing
//! let east = geo_utils::bearing(&start, &end);
//! let west = geo_utils::bearing(&end, &start);
//! assert!(geo_utils::angle_difference(east, west) < 1e-6);
//! ```

use geo::{Bearing, Destination, Distance, Haversine, InterpolatePoint, Point};
use std::f64::consts::PI;

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters, matching [`geo::Haversine`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[inline]
fn to_point(p: &GpsPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

#[inline]
fn from_point(p: Point<f64>) -> GpsPoint {
    GpsPoint::new(p.y(), p.x())
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Distance in meters from `p` to the great-circle segment `a`–`b`.
///
/// Uses the cross-track distance when the perpendicular foot falls inside the
/// segment, otherwise the distance to the nearer endpoint. A zero-length
/// segment degrades to point-to-point distance.
pub fn point_to_line_distance(p: &GpsPoint, a: &GpsPoint, b: &GpsPoint) -> f64 {
    let segment_length = haversine_distance(a, b);
    let to_point = haversine_distance(a, p);
    if segment_length == 0.0 || to_point == 0.0 {
        return to_point;
    }

    let delta = (bearing_degrees(a, p) - bearing_degrees(a, b)).to_radians();

    // Foot of the perpendicular lies behind `a`
    if delta.cos() <= 0.0 {
        return to_point;
    }

    let angular = to_point / EARTH_RADIUS_METERS;
    let cross_track = (angular.sin() * delta.sin()).clamp(-1.0, 1.0).asin();
    let along_track = (angular.cos() / cross_track.cos()).clamp(-1.0, 1.0).acos() * EARTH_RADIUS_METERS;

    if along_track >= segment_length {
        return haversine_distance(p, b);
    }

    (cross_track * EARTH_RADIUS_METERS).abs()
}

/// Calculate the total length of a polyline (GPS track) in meters.
///
/// Empty or single-point tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Earth-centered position of `p` on the unit sphere, `[x, y, z]`.
///
/// Unlike latitude/longitude, the straight-line distance between two unit
/// vectors has no seam at the antimeridian and no singularity at the poles.
#[inline]
pub fn unit_vector(p: &GpsPoint) -> [f64; 3] {
    let (lat, lng) = (p.latitude.to_radians(), p.longitude.to_radians());
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Straight-line distance between two unit vectors whose great-circle
/// distance is `meters`.
#[inline]
pub fn chord_length(meters: f64) -> f64 {
    let central_angle = (meters / EARTH_RADIUS_METERS).min(PI);
    2.0 * (central_angle / 2.0).sin()
}

// =============================================================================
// Bearing Functions
// =============================================================================

/// Signed initial bearing from `p1` to `p2` in degrees, in `(-180, 180]`.
///
/// Identical points yield 0.
#[inline]
pub fn bearing_degrees(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    normalize_bearing_degrees(Haversine::bearing(to_point(p1), to_point(p2)))
}

/// Direction-agnostic bearing from `p1` to `p2` in radians.
///
/// Negative signed bearings have 180° added, so a line and its reverse share
/// a bearing. The result lies in `[0, π]`.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let north = GpsPoint::new(0.001, 0.0);
/// assert!(geo_utils::bearing(&a, &north).abs() < 1e-9);
/// assert!(geo_utils::bearing(&north, &a) > 3.14);
/// ```
#[inline]
pub fn bearing(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let mut degrees = bearing_degrees(p1, p2);
    if degrees < 0.0 {
        degrees += 180.0;
    }
    degrees / 180.0 * PI
}

/// Smallest unsigned angle between two bearings in radians, in `[0, π]`.
///
/// Goes through `atan2(sin, cos)` so values on either side of the wrap
/// compare correctly.
#[inline]
pub fn angle_difference(a1: f64, a2: f64) -> f64 {
    let delta = a1 - a2;
    delta.sin().atan2(delta.cos()).abs()
}

/// Wrap a bearing in degrees into `[-180, 180]`.
pub fn normalize_bearing_degrees(mut degrees: f64) -> f64 {
    while degrees < -180.0 {
        degrees += 360.0;
    }
    while degrees > 180.0 {
        degrees -= 360.0;
    }
    degrees
}

// =============================================================================
// Projection Functions
// =============================================================================

/// Great-circle midpoint between two GPS points.
#[inline]
pub fn midpoint(p1: &GpsPoint, p2: &GpsPoint) -> GpsPoint {
    from_point(Haversine::point_at_ratio_between(to_point(p1), to_point(p2), 0.5))
}

/// Project `meters` from `origin` along `bearing_degrees`.
///
/// The bearing is normalized into `[-180, 180]` first; negative distances
/// project backwards.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, geo_utils};
///
/// let origin = GpsPoint::new(40.0, -74.0);
/// let north = geo_utils::destination(&origin, 360.0, 111.0);
/// assert!(north.latitude > origin.latitude);
/// assert!((north.longitude - origin.longitude).abs() < 1e-9);
/// ```
#[inline]
pub fn destination(origin: &GpsPoint, bearing_degrees: f64, meters: f64) -> GpsPoint {
    from_point(Haversine::destination(
        to_point(origin),
        normalize_bearing_degrees(bearing_degrees),
        meters,
    ))
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a GPS track.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_polyline_length_degenerate() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(51.5074, -0.1278)]), 0.0);
    }

    #[test]
    fn test_destination_round_trip_distance() {
        let origin = GpsPoint::new(47.37, 8.55);
        for bearing in [-170.0, -45.0, 0.0, 33.0, 90.0, 181.0, 400.0] {
            let target = destination(&origin, bearing, 70.0);
            assert!(approx_eq(haversine_distance(&origin, &target), 70.0, 1e-6));
        }
    }

    #[test]
    fn test_destination_normalizes_bearing() {
        let origin = GpsPoint::new(47.37, 8.55);
        let a = destination(&origin, 450.0, 50.0);
        let b = destination(&origin, 90.0, 50.0);
        assert!(approx_eq(a.latitude, b.latitude, 1e-12));
        assert!(approx_eq(a.longitude, b.longitude, 1e-12));
    }

    #[test]
    fn test_bearing_is_direction_agnostic() {
        let a = GpsPoint::new(47.37, 8.55);
        for degrees in [10.0, 60.0, 135.0, 179.0] {
            let b = destination(&a, degrees, 100.0);
            let forward = bearing(&a, &b);
            let backward = bearing(&b, &a);
            assert!((0.0..=PI).contains(&forward));
            assert!(angle_difference(forward, backward) < 1e-6);
            assert!(approx_eq(forward, (degrees as f64).to_radians(), 1e-3));
        }
    }

    #[test]
    fn test_bearing_degrees_signed() {
        let a = GpsPoint::new(47.37, 8.55);
        let west = destination(&a, -90.0, 100.0);
        assert!(approx_eq(bearing_degrees(&a, &west), -90.0, 0.01));
        assert_eq!(bearing_degrees(&a, &a), 0.0);
    }

    #[test]
    fn test_angle_difference_wraps() {
        assert!(approx_eq(angle_difference(0.1, 2.0 * PI - 0.1), 0.2, 1e-12));
        assert!(approx_eq(angle_difference(0.0, PI), PI, 1e-12));
        assert!(approx_eq(angle_difference(FRAC_PI_2, 0.0), FRAC_PI_2, 1e-12));
    }

    #[test]
    fn test_normalize_bearing_degrees() {
        assert_eq!(normalize_bearing_degrees(190.0), -170.0);
        assert_eq!(normalize_bearing_degrees(-540.0), -180.0);
        assert_eq!(normalize_bearing_degrees(180.0), 180.0);
        assert_eq!(normalize_bearing_degrees(45.0), 45.0);
    }

    #[test]
    fn test_midpoint_is_equidistant() {
        let a = GpsPoint::new(47.37, 8.55);
        let b = destination(&a, 60.0, 120.0);
        let m = midpoint(&a, &b);
        assert!(approx_eq(haversine_distance(&a, &m), 60.0, 1e-6));
        assert!(approx_eq(haversine_distance(&m, &b), 60.0, 1e-6));
    }

    #[test]
    fn test_point_to_line_distance_perpendicular() {
        let a = GpsPoint::new(47.37, 8.55);
        let b = destination(&a, 90.0, 100.0);
        let foot = destination(&a, 90.0, 40.0);
        let p = destination(&foot, 0.0, 3.0);
        assert!(approx_eq(point_to_line_distance(&p, &a, &b), 3.0, 0.01));
    }

    #[test]
    fn test_point_to_line_distance_clamps_to_endpoints() {
        let a = GpsPoint::new(47.37, 8.55);
        let b = destination(&a, 90.0, 100.0);
        let behind = destination(&a, 270.0, 10.0);
        let beyond = destination(&b, 90.0, 20.0);
        assert!(approx_eq(point_to_line_distance(&behind, &a, &b), 10.0, 0.01));
        assert!(approx_eq(point_to_line_distance(&beyond, &a, &b), 20.0, 0.01));
    }

    #[test]
    fn test_point_to_line_distance_zero_length_segment() {
        let a = GpsPoint::new(47.37, 8.55);
        let p = destination(&a, 45.0, 5.0);
        assert!(approx_eq(point_to_line_distance(&p, &a, &a), 5.0, 1e-6));
    }

    #[test]
    fn test_compute_bounds() {
        let track = vec![
            GpsPoint::new(51.50, -0.13),
            GpsPoint::new(51.51, -0.12),
            GpsPoint::new(51.505, -0.125),
        ];
        let bounds = compute_bounds(&track).unwrap();
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lat, 51.51);
        assert_eq!(bounds.min_lng, -0.13);
        assert_eq!(bounds.max_lng, -0.12);
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_chord_matches_unit_vectors() {
        let a = GpsPoint::new(-16.8, 179.9999);
        let b = destination(&a, 90.0, 50.0);
        let (va, vb) = (unit_vector(&a), unit_vector(&b));
        let chord = ((va[0] - vb[0]).powi(2) + (va[1] - vb[1]).powi(2) + (va[2] - vb[2]).powi(2)).sqrt();

        assert!(b.longitude < 0.0);
        assert!(approx_eq(chord, chord_length(50.0), 1e-12));
        assert!(chord_length(60.0) > chord_length(50.0));
        assert!(approx_eq(chord_length(PI * EARTH_RADIUS_METERS), 2.0, 1e-12));
    }
}
