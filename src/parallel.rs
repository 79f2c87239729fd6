//! # Parallel Segment Matching
//!
//! Pairs extracted line segments that look like the two straights of a
//! running track: parallel, facing each other across a turn, and a plausible
//! track width apart.
//!
//! Each newly extracted segment is tested against every earlier segment, in
//! extraction order, through three hard gates:
//! 1. **Parallelism** - axial bearings within `parallel_angle_threshold` of
//!    0° or 180°
//! 2. **Tangency** - the line joining the two segment midpoints must be within
//!    `tangent_angle_threshold` of perpendicular to the segments
//! 3. **Separation** - midpoint distance within
//!    `[min_parallel_distance, max_parallel_distance]`

use log::debug;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::geo_utils::{angle_difference, bearing, haversine_distance, midpoint};
use crate::segments::{LineSegment, LineSegments};
use crate::{GpsPoint, TrackConfig};

/// A pair of segments judged to be the two straights of an oval.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParallelSegmentCandidate {
    /// Earlier and later segment, in extraction order
    pub segments: (LineSegment, LineSegment),
    /// Cross midpoints: between the paired start ends and between the paired far ends
    pub mid: (GpsPoint, GpsPoint),
    /// Half the distance between the two segments' midpoints, in meters
    pub radius_m: f64,
}

/// Mean of two axial bearings in `[0, π]`.
///
/// Bearings on either side of the 0/π seam describe nearly the same axis, so
/// one of them is shifted by π before averaging.
fn axial_mean(b1: f64, b2: f64) -> f64 {
    if (b1 - b2).abs() > FRAC_PI_2 {
        ((b1 + b2 + PI) / 2.0) % PI
    } else {
        (b1 + b2) / 2.0
    }
}

/// Gate a pair of segments with pre-computed axial bearings and midpoints.
fn match_with_cache(
    a: &LineSegment,
    bearing_a: f64,
    mid_a: &GpsPoint,
    b: &LineSegment,
    bearing_b: f64,
    mid_b: &GpsPoint,
    config: &TrackConfig,
) -> Option<ParallelSegmentCandidate> {
    // Check threshold at 0 and 180 degrees
    let angle = angle_difference(bearing_a, bearing_b);
    let threshold = config.parallel_angle_threshold;
    if angle > threshold && angle < PI - threshold {
        return None;
    }

    // Pair up the ends that face each other across the turns
    let should_swap = haversine_distance(&a.p1, &b.p2) < haversine_distance(&a.p1, &b.p1);
    let (b_start, b_end) = if should_swap { (b.p2, b.p1) } else { (b.p1, b.p2) };
    let cross_start = midpoint(&a.p1, &b_start);
    let cross_end = midpoint(&a.p2, &b_end);

    // The straights must face each other, not continue one another
    let tangent = angle_difference(bearing(mid_a, mid_b), axial_mean(bearing_a, bearing_b));
    if tangent < FRAC_PI_2 - config.tangent_angle_threshold
        || tangent > FRAC_PI_2 + config.tangent_angle_threshold
    {
        return None;
    }

    let separation = haversine_distance(mid_a, mid_b);
    if separation < config.min_parallel_distance || separation > config.max_parallel_distance {
        return None;
    }

    Some(ParallelSegmentCandidate {
        segments: (*a, *b),
        mid: (cross_start, cross_end),
        radius_m: separation / 2.0,
    })
}

/// Test whether two segments could be the opposite straights of a track.
///
/// `a` is treated as the earlier segment; the returned candidate keeps that
/// order.
pub fn match_segments(
    a: &LineSegment,
    b: &LineSegment,
    config: &TrackConfig,
) -> Option<ParallelSegmentCandidate> {
    match_with_cache(
        a,
        bearing(&a.p1, &a.p2),
        &midpoint(&a.p1, &a.p2),
        b,
        bearing(&b.p1, &b.p2),
        &midpoint(&b.p1, &b.p2),
        config,
    )
}

/// Lazy stream of [`ParallelSegmentCandidate`]s over a segment scan.
///
/// Segments are pulled from the underlying [`LineSegments`] only when every
/// pairing of the latest segment with its predecessors has been tested, so a
/// consumer that stops early never pays for the rest of the scan.
#[derive(Debug, Clone)]
pub struct ParallelSegments<'a> {
    stream: LineSegments<'a>,
    config: &'a TrackConfig,
    segments: Vec<LineSegment>,
    bearings: Vec<f64>,
    midpoints: Vec<GpsPoint>,
    cursor: usize,
}

impl<'a> ParallelSegments<'a> {
    /// Match segments as `stream` produces them.
    pub fn new(stream: LineSegments<'a>, config: &'a TrackConfig) -> Self {
        Self {
            stream,
            config,
            segments: Vec::new(),
            bearings: Vec::new(),
            midpoints: Vec::new(),
            cursor: 0,
        }
    }

    /// Segments extracted so far, in extraction order.
    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    /// True if the underlying scan stopped because its budget ran out.
    pub fn was_interrupted(&self) -> bool {
        self.stream.was_interrupted()
    }
}

impl Iterator for ParallelSegments<'_> {
    type Item = ParallelSegmentCandidate;

    fn next(&mut self) -> Option<ParallelSegmentCandidate> {
        loop {
            if let Some(latest) = self.segments.len().checked_sub(1) {
                while self.cursor < latest {
                    let i = self.cursor;
                    self.cursor += 1;

                    let candidate = match_with_cache(
                        &self.segments[i],
                        self.bearings[i],
                        &self.midpoints[i],
                        &self.segments[latest],
                        self.bearings[latest],
                        &self.midpoints[latest],
                        self.config,
                    );
                    if let Some(candidate) = candidate {
                        debug!(
                            "[Parallel] Segments {} and {} pair up, radius {:.1}m",
                            i, latest, candidate.radius_m
                        );
                        return Some(candidate);
                    }
                }
            }

            let segment = self.stream.next()?;
            self.bearings.push(bearing(&segment.p1, &segment.p2));
            self.midpoints.push(midpoint(&segment.p1, &segment.p2));
            self.segments.push(segment);
            self.cursor = 0;
        }
    }
}
