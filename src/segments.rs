//! # Line Segment Extraction
//!
//! Scans a recording for near-straight runs that could be the straights of a
//! running track.
//!
//! ## Algorithm
//! 1. From a start index, extend the end index one coordinate at a time
//! 2. Chords shorter than `min_line_segment` are skipped outright
//! 3. If the chord's MSE exceeds `max_line_mse`, the run is over: the outer
//!    scan resumes at the coordinate that broke it
//! 4. While the chord is no longer than `max_line_segment`, it replaces the
//!    retained candidate (longest valid run wins)
//! 5. The retained candidate, if any, is emitted before the next start
//!
//! An invalid coordinate ends the current run; the scan resumes after it.
//!
//! The scan is greedy and single-pass: it never revisits starts inside a run
//! that has already been extended, trading completeness for near-linear cost.

use log::debug;

use crate::geo_utils::{haversine_distance, point_to_line_distance};
use crate::track::SearchBudget;
use crate::{GpsPoint, TrackConfig};

/// A near-straight run over the coordinate sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSegment {
    /// Index of the first coordinate of the run
    pub start_index: usize,
    /// Index of the last coordinate of the run
    pub end_index: usize,
    /// First coordinate (chord start)
    pub p1: GpsPoint,
    /// Last coordinate (chord end)
    pub p2: GpsPoint,
    /// Chord length in meters
    pub length_m: f64,
    /// Mean squared perpendicular deviation from the chord (m²)
    pub mse: f64,
}

/// Mean squared distance of the interior coordinates of `coords[start..=end]`
/// from the chord `coords[start]`–`coords[end]`.
///
/// The sum is divided by the number of coordinates in the run, endpoints
/// included, so the divisor is never below 2 for `start < end`.
pub fn chord_mse(coords: &[GpsPoint], start: usize, end: usize) -> f64 {
    if end <= start || end >= coords.len() {
        return 0.0;
    }

    let p1 = &coords[start];
    let p2 = &coords[end];
    let total: f64 = coords[start + 1..end]
        .iter()
        .map(|p| point_to_line_distance(p, p1, p2).powi(2))
        .sum();

    total / (end - start + 1) as f64
}

/// Lazy stream of [`LineSegment`] candidates.
///
/// The iterator is finite and never materializes the full candidate list.
/// Cloning it, or building a fresh one with [`line_segments`], restarts the
/// scan from the beginning.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, TrackConfig, geo_utils, segments::line_segments};
///
/// // 198m straight line, one coordinate every 3m
/// let origin = GpsPoint::new(47.37, 8.55);
/// let coords: Vec<GpsPoint> = (0..67)
///     .map(|i| geo_utils::destination(&origin, 45.0, i as f64 * 3.0))
///     .collect();
///
/// let config = TrackConfig::default();
/// let first = line_segments(&coords, &config).next().unwrap();
/// assert_eq!(first.start_index, 0);
/// assert_eq!(first.end_index, 46); // 138m, the longest chord within 140m
/// ```
#[derive(Debug, Clone)]
pub struct LineSegments<'a> {
    coords: &'a [GpsPoint],
    config: &'a TrackConfig,
    budget: SearchBudget,
    start: usize,
    interrupted: bool,
}

/// Start a segment scan over `coords` with an unlimited budget.
pub fn line_segments<'a>(coords: &'a [GpsPoint], config: &'a TrackConfig) -> LineSegments<'a> {
    LineSegments::new(coords, config, SearchBudget::unlimited())
}

impl<'a> LineSegments<'a> {
    /// Start a segment scan that stops early once `budget` is exhausted.
    pub fn new(coords: &'a [GpsPoint], config: &'a TrackConfig, budget: SearchBudget) -> Self {
        Self {
            coords,
            config,
            budget,
            start: 0,
            interrupted: false,
        }
    }

    /// True if the scan ended because the budget ran out.
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Scan a single start index.
    ///
    /// Returns the retained candidate and the start index to resume from.
    fn scan_from(&mut self, start: usize) -> Option<(Option<LineSegment>, usize)> {
        let coords = self.coords;
        let config = self.config;
        let p1 = coords[start];
        if !p1.is_valid() {
            return Some((None, start + 1));
        }

        let mut retained: Option<LineSegment> = None;
        let mut resume = start + 1;

        for end in (start + 1)..coords.len() {
            if self.budget.is_exhausted() {
                return None;
            }

            let p2 = coords[end];
            if !p2.is_valid() {
                // Runs never span an invalid coordinate
                resume = end + 1;
                break;
            }
            let length_m = haversine_distance(&p1, &p2);

            // Filter only line segments of the right length
            if length_m < config.min_line_segment {
                continue;
            }

            let mse = chord_mse(coords, start, end);
            if mse > config.max_line_mse {
                resume = end;
                break;
            }

            if length_m > config.max_line_segment {
                // Too long to be a straight, keep scanning for the break
                continue;
            }

            retained = Some(LineSegment {
                start_index: start,
                end_index: end,
                p1,
                p2,
                length_m,
                mse,
            });
        }

        Some((retained, resume))
    }
}

impl Iterator for LineSegments<'_> {
    type Item = LineSegment;

    fn next(&mut self) -> Option<LineSegment> {
        while self.start + 1 < self.coords.len() {
            let Some((retained, resume)) = self.scan_from(self.start) else {
                debug!("[Segments] Budget exhausted at start index {}", self.start);
                self.interrupted = true;
                self.start = self.coords.len();
                return None;
            };
            self.start = resume;

            if let Some(segment) = retained {
                debug!(
                    "[Segments] Candidate {}..{} ({:.1}m, mse {:.2})",
                    segment.start_index, segment.end_index, segment.length_m, segment.mse
                );
                return Some(segment);
            }
        }

        None
    }
}
