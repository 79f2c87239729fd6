//! # Track Finder
//!
//! Running-track oval detection from recorded GPS coordinates.
//!
//! This library provides:
//! - Straight-run extraction from a coordinate sequence
//! - Parallel-straight matching for oval candidates
//! - Spatial-index-backed arc fitting for the two turns
//! - A closed polyline (and optional GeoJSON) of the detected oval
//!
//! ## Features
//!
//! - **`parallel`** - Score arc centers in parallel with rayon
//! - **`serde`** - Serialize/deserialize inference results
//! - **`geojson`** - Export detected tracks as GeoJSON features
//! - **`synthetic`** - Synthetic oval and random-walk recordings
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use track_finder::{GpsPoint, TrackConfig, identify_track, track_to_line};
//!
//! let coords: Vec<GpsPoint> = vec![
//!     GpsPoint::new(51.5074, -0.1278),
//!     GpsPoint::new(51.5080, -0.1290),
//! ];
//!
//! let inference = identify_track(&coords, &TrackConfig::default());
//! match track_to_line(Some(&inference)) {
//!     Some(outline) => println!("Track with {} outline points", outline.len()),
//!     None => println!("No track found ({:?})", inference.outcome),
//! }
//! ```

use std::time::Duration;

// Geometry primitives
pub mod geo_utils;

// R-tree neighbour search over the recording
pub mod spatial;

// Detection pipeline, leaf-first
pub mod segments;
pub use segments::{line_segments, LineSegment, LineSegments};

pub mod parallel;
pub use parallel::{match_segments, ParallelSegmentCandidate, ParallelSegments};

pub mod arc;
pub use arc::{evaluate_arc_fitness, ArcCandidate, ArcFitness, ArcSide};

pub mod track;
pub use track::{
    identify_track, identify_track_with_budget, SearchBudget, SearchOutcome, TrackInference,
    TrackShape,
};

// Outline generation
pub mod polyline;
pub use polyline::track_to_line;

#[cfg(feature = "geojson")]
pub use polyline::track_to_geojson;

// Raw record filtering
pub mod ingest;
pub use ingest::{coordinates_from_lng_lat, coordinates_from_records, PositionRecord};

// Synthetic recordings (always available to unit tests)
#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use track_finder::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// assert_eq!(point.to_lng_lat(), [-0.1278, 51.5074]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Create a point from a `[longitude, latitude]` pair.
    pub fn from_lng_lat(lng_lat: [f64; 2]) -> Self {
        Self::new(lng_lat[1], lng_lat[0])
    }

    /// `[longitude, latitude]`, the GeoJSON position order.
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Thresholds for every stage of track detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackConfig {
    /// Shortest chord considered a straight (inclusive).
    /// Default: 65.0 meters
    pub min_line_segment: f64,

    /// Longest chord retained as a straight (inclusive).
    /// Default: 140.0 meters
    pub max_line_segment: f64,

    /// Straightness ceiling: mean squared deviation from the chord (inclusive).
    /// Default: 5.0 m²
    pub max_line_mse: f64,

    /// Tolerance around 0 and π for two straights to count as parallel (radians).
    /// Default: π/6
    pub parallel_angle_threshold: f64,

    /// Tolerance around perpendicular for the line joining the straights (radians).
    /// Default: π/6
    pub tangent_angle_threshold: f64,

    /// Minimum distance between paired straights (inclusive).
    /// Default: 50.0 meters
    pub min_parallel_distance: f64,

    /// Maximum distance between paired straights (inclusive).
    /// Default: 100.0 meters
    pub max_parallel_distance: f64,

    /// Arc centers are tried over `[-span, +span]` along the track axis.
    /// Default: 35.0 meters
    pub arc_center_span: f64,

    /// Number of arc center offsets tried per side.
    /// Default: 15
    pub arc_center_steps: u32,

    /// Wedge next to each tangent point that is not sampled.
    /// Default: 20.0 degrees
    pub arc_angle_padding_degrees: f64,

    /// Number of sampled angles per arc center.
    /// Default: 15
    pub arc_angle_steps: u32,

    /// Neighbour search radius around each arc sample (strict).
    /// Default: 7.0 meters
    pub arc_search_radius: f64,

    /// Combined fitness above which the first matching track is accepted.
    /// Default: 5.0
    pub acceptance_fitness: f64,

    /// Wall-clock budget for one search. `None` runs to completion.
    /// Default: None
    pub max_duration: Option<Duration>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            min_line_segment: 65.0,
            max_line_segment: 140.0,
            max_line_mse: 5.0,
            parallel_angle_threshold: std::f64::consts::FRAC_PI_6,
            tangent_angle_threshold: std::f64::consts::FRAC_PI_6,
            min_parallel_distance: 50.0,
            max_parallel_distance: 100.0,
            arc_center_span: 35.0,
            arc_center_steps: 15,
            arc_angle_padding_degrees: 20.0,
            arc_angle_steps: 15,
            arc_search_radius: 7.0,
            acceptance_fitness: 5.0,
            max_duration: None,
        }
    }
}
