//! # Arc Fitness Evaluation
//!
//! Searches for the turn centers of a candidate track.
//!
//! For each side of a [`ParallelSegmentCandidate`] the evaluator slides a
//! candidate center along the track axis, samples points on the semicircle
//! that center would trace at the pair's radius, and asks the spatial index
//! how well the recording covers each sample.
//!
//! ## Scoring
//!
//! Every sampled angle becomes a bin scored as the sum of `1 - d / r` over
//! recorded points within the search radius `r`, so closer points count
//! more. A center's fitness is the **minimum** bin: a real turn has recorded
//! points along its entire sampled arc, not just a cluster at one angle.
//!
//! With the `parallel` feature the offset grid is scored on the rayon pool.
//! Results are reduced in offset order, so both builds return the same arcs.

use log::debug;

use crate::geo_utils::{bearing_degrees, destination};
use crate::parallel::ParallelSegmentCandidate;
use crate::spatial::CoordinateIndex;
use crate::{GpsPoint, TrackConfig};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One end of a parallel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArcSide {
    /// The turn beyond the first cross midpoint
    Top,
    /// The turn beyond the second cross midpoint
    Bottom,
}

/// Proposed turn center for one side of an oval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcCandidate {
    pub center: GpsPoint,
    pub radius_m: f64,
    /// Worst-case bin score along the sampled arc
    pub fitness: f64,
}

/// Best arc per side for one parallel pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcFitness {
    pub top: Option<ArcCandidate>,
    pub bottom: Option<ArcCandidate>,
    /// Fitness of `top`, 0 when absent
    pub top_fitness: f64,
    /// Fitness of `bottom`, 0 when absent
    pub bottom_fitness: f64,
}

impl ArcFitness {
    /// Worst of the two sides, if both produced an arc.
    pub fn combined(&self) -> Option<f64> {
        match (&self.top, &self.bottom) {
            (Some(_), Some(_)) => Some(self.top_fitness.min(self.bottom_fitness)),
            _ => None,
        }
    }
}

/// `steps` values evenly spaced over `[-span, span]`.
fn symmetric_range(span: f64, steps: u32) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..steps)
            .map(|i| -span + (i as f64 / (steps - 1) as f64) * (span * 2.0))
            .collect(),
    }
}

/// Offsets (meters along the track axis) tried for each arc center.
pub fn center_offsets(config: &TrackConfig) -> Vec<f64> {
    symmetric_range(config.arc_center_span, config.arc_center_steps)
}

/// Sample angles (degrees from the axis) skipping the padded wedge next to
/// each tangent point.
pub fn sample_angles(config: &TrackConfig) -> Vec<f64> {
    symmetric_range(90.0 - config.arc_angle_padding_degrees, config.arc_angle_steps)
}

/// Cross midpoint a side is anchored on, and the axis bearing pointing out
/// through that side's turn.
fn side_anchor(pair: &ParallelSegmentCandidate, side: ArcSide) -> (GpsPoint, f64) {
    let (first, second) = pair.mid;
    match side {
        ArcSide::Top => (first, bearing_degrees(&second, &first)),
        ArcSide::Bottom => (second, bearing_degrees(&first, &second)),
    }
}

/// Score the arc centered `offset` meters along the axis from `side`'s anchor.
///
/// Returns the center and its fitness (minimum bin score).
pub fn center_fitness(
    pair: &ParallelSegmentCandidate,
    side: ArcSide,
    offset: f64,
    n_coords: usize,
    index: &CoordinateIndex,
    config: &TrackConfig,
) -> (GpsPoint, f64) {
    let (anchor, axis_bearing) = side_anchor(pair, side);
    let center = destination(&anchor, axis_bearing, offset);
    let search_radius = config.arc_search_radius;

    let score = sample_angles(config)
        .iter()
        .map(|angle| {
            let sample = destination(&center, axis_bearing + angle, pair.radius_m);
            index
                .nearest(&sample, n_coords, search_radius)
                .iter()
                .map(|n| 1.0 - n.distance / search_radius)
                .sum::<f64>()
        })
        .fold(None, |worst: Option<f64>, bin| Some(worst.map_or(bin, |w| w.min(bin))))
        .unwrap_or(0.0);

    (center, score)
}

/// Find the best-covered arc center on each side of `pair`.
///
/// Only strictly positive fitness produces a candidate; among equal scores
/// the first offset wins.
pub fn evaluate_arc_fitness(
    pair: &ParallelSegmentCandidate,
    n_coords: usize,
    index: &CoordinateIndex,
    config: &TrackConfig,
) -> ArcFitness {
    let offsets = center_offsets(config);
    let grid: Vec<(ArcSide, f64)> = [ArcSide::Top, ArcSide::Bottom]
        .iter()
        .flat_map(|&side| offsets.iter().map(move |&offset| (side, offset)))
        .collect();

    let score = |&(side, offset): &(ArcSide, f64)| {
        let (center, fitness) = center_fitness(pair, side, offset, n_coords, index, config);
        (side, center, fitness)
    };

    #[cfg(feature = "parallel")]
    let scored: Vec<(ArcSide, GpsPoint, f64)> = grid.par_iter().map(score).collect();

    #[cfg(not(feature = "parallel"))]
    let scored: Vec<(ArcSide, GpsPoint, f64)> = grid.iter().map(score).collect();

    let mut result = ArcFitness {
        top: None,
        bottom: None,
        top_fitness: 0.0,
        bottom_fitness: 0.0,
    };

    for (side, center, fitness) in scored {
        let (best, best_fitness) = match side {
            ArcSide::Top => (&mut result.top, &mut result.top_fitness),
            ArcSide::Bottom => (&mut result.bottom, &mut result.bottom_fitness),
        };
        if fitness > *best_fitness {
            *best = Some(ArcCandidate {
                center,
                radius_m: pair.radius_m,
                fitness,
            });
            *best_fitness = fitness;
        }
    }

    debug!(
        "[Arc] Pair radius {:.1}m: top {:.2}, bottom {:.2}",
        pair.radius_m, result.top_fitness, result.bottom_fitness
    );

    result
}
