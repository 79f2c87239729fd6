//! # Track Shape Assembly
//!
//! Drives the detection pipeline for one recording:
//! coordinates → segments → parallel pairs → arc fitness → best track shape.
//!
//! Every parallel pair considered is kept in the result. The best shape is
//! the pair whose weaker turn scores highest, and the search stops at the
//! first shape whose weaker turn exceeds `acceptance_fitness`: it is an
//! any-good-enough search, not a global optimum.
//!
//! A [`SearchBudget`] bounds the search by wall-clock deadline and/or a shared
//! cancel flag. An interrupted search reports no track.

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::arc::evaluate_arc_fitness;
use crate::geo_utils::bearing_degrees;
use crate::parallel::{ParallelSegmentCandidate, ParallelSegments};
use crate::segments::LineSegments;
use crate::spatial::CoordinateIndex;
use crate::{GpsPoint, TrackConfig};

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchOutcome {
    /// A shape exceeded the acceptance threshold and the search stopped early
    Accepted,
    /// Every candidate was considered
    Exhausted,
    /// The budget's deadline passed
    DeadlineExceeded,
    /// The budget's cancel flag was raised
    Cancelled,
}

impl std::fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchOutcome::Accepted => write!(f, "accepted"),
            SearchOutcome::Exhausted => write!(f, "exhausted"),
            SearchOutcome::DeadlineExceeded => write!(f, "deadline exceeded"),
            SearchOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Limits on how long a search may run.
///
/// Cheap to clone; clones share the same cancel flag.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
/// use track_finder::SearchBudget;
///
/// let cancel = Arc::new(AtomicBool::new(false));
/// let budget = SearchBudget::unlimited().with_cancel_flag(cancel.clone());
/// assert!(!budget.is_exhausted());
///
/// cancel.store(true, Ordering::Relaxed);
/// assert!(budget.is_exhausted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchBudget {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchBudget {
    /// No deadline and no cancel flag.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Deadline of `config.max_duration` from now, if set.
    pub fn from_config(config: &TrackConfig) -> Self {
        Self {
            deadline: config
                .max_duration
                .and_then(|duration| Instant::now().checked_add(duration)),
            cancel: None,
        }
    }

    /// Stop once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Why the budget is exhausted, or `None` if the search may continue.
    /// Cancellation takes precedence over the deadline.
    pub fn exhaustion(&self) -> Option<SearchOutcome> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some(SearchOutcome::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(SearchOutcome::DeadlineExceeded),
            _ => None,
        }
    }

    /// True once the search should stop.
    pub fn is_exhausted(&self) -> bool {
        self.exhaustion().is_some()
    }
}

/// Idealized oval: two turn centers, the axis between them, and per-turn
/// radius and fitness (top, bottom).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackShape {
    /// Top and bottom turn centers
    pub mid: (GpsPoint, GpsPoint),
    /// Signed bearing from the top center to the bottom center
    pub bearing_degrees: f64,
    /// Turn radii in meters
    pub radii: (f64, f64),
    /// Turn fitness scores
    pub fitness: (f64, f64),
}

impl TrackShape {
    /// Fitness of the weaker turn.
    pub fn combined_fitness(&self) -> f64 {
        self.fitness.0.min(self.fitness.1)
    }
}

/// Result of one track search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackInference {
    /// Best shape found, `None` if no track was detected
    pub arc: Option<TrackShape>,
    /// Every parallel pair considered, in discovery order
    pub parallel_segments: Vec<ParallelSegmentCandidate>,
    pub outcome: SearchOutcome,
}

/// Detect a running-track oval in `coords`.
///
/// Runs with the deadline from `config.max_duration`, if any. Degenerate
/// input (empty, a single point, a stationary cluster) yields no track.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, SearchOutcome, TrackConfig, identify_track};
///
/// let stationary = vec![GpsPoint::new(47.37, 8.55); 100];
/// let inference = identify_track(&stationary, &TrackConfig::default());
/// assert!(inference.arc.is_none());
/// assert!(inference.parallel_segments.is_empty());
/// assert_eq!(inference.outcome, SearchOutcome::Exhausted);
/// ```
pub fn identify_track(coords: &[GpsPoint], config: &TrackConfig) -> TrackInference {
    identify_track_with_budget(coords, config, SearchBudget::from_config(config))
}

/// Detect a running-track oval in `coords`, stopping early when `budget` is
/// exhausted.
///
/// An interrupted search returns no shape but keeps the parallel pairs
/// already considered. Invalid coordinates (non-finite or out of range) are
/// dropped before the search, so segment indices refer to the valid
/// coordinates in input order.
pub fn identify_track_with_budget(
    coords: &[GpsPoint],
    config: &TrackConfig,
    budget: SearchBudget,
) -> TrackInference {
    let start = Instant::now();
    let valid: Vec<GpsPoint> = coords.iter().copied().filter(GpsPoint::is_valid).collect();
    if valid.len() < coords.len() {
        debug!("[Track] Skipping {} invalid coordinates", coords.len() - valid.len());
    }
    let coords = valid.as_slice();
    info!("[Track] Searching {} coordinates", coords.len());

    let index = CoordinateIndex::build(coords);
    let n_coords = index.len();

    let mut pairs = ParallelSegments::new(LineSegments::new(coords, config, budget.clone()), config);
    let mut parallel_segments: Vec<ParallelSegmentCandidate> = Vec::new();
    let mut best: Option<TrackShape> = None;

    let outcome = loop {
        if let Some(reason) = budget.exhaustion() {
            break reason;
        }

        let Some(pair) = pairs.next() else {
            if pairs.was_interrupted() {
                break budget.exhaustion().unwrap_or(SearchOutcome::Cancelled);
            }
            break SearchOutcome::Exhausted;
        };

        let fitness = evaluate_arc_fitness(&pair, n_coords, &index, config);
        parallel_segments.push(pair);

        let (Some(top), Some(bottom), Some(combined)) = (fitness.top, fitness.bottom, fitness.combined())
        else {
            continue;
        };

        if best.map_or(true, |b| combined > b.combined_fitness()) {
            debug!("[Track] New best shape, fitness {:.2}", combined);
            best = Some(TrackShape {
                mid: (top.center, bottom.center),
                bearing_degrees: bearing_degrees(&top.center, &bottom.center),
                radii: (top.radius_m, bottom.radius_m),
                fitness: (fitness.top_fitness, fitness.bottom_fitness),
            });
        }

        if combined > config.acceptance_fitness {
            break SearchOutcome::Accepted;
        }
    };

    if matches!(outcome, SearchOutcome::DeadlineExceeded | SearchOutcome::Cancelled) {
        best = None;
    }

    info!(
        "[Track] {} after {} pairs ({} segments) in {:?}, track {}",
        outcome,
        parallel_segments.len(),
        pairs.segments().len(),
        start.elapsed(),
        if best.is_some() { "found" } else { "not found" }
    );

    TrackInference {
        arc: best,
        parallel_segments,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{random_walk, OvalTrack};
    use std::time::Duration;

    fn axial_offset(bearing: f64, expected: f64) -> f64 {
        let d = (bearing - expected).rem_euclid(180.0);
        d.min(180.0 - d)
    }

    #[test]
    fn test_degenerate_inputs_have_no_track() {
        let config = TrackConfig::default();
        let origin = GpsPoint::new(47.37, 8.55);
        let cluster: Vec<GpsPoint> = (0..200)
            .map(|i| crate::geo_utils::destination(&origin, i as f64 * 17.0, (i % 3) as f64 * 0.3))
            .collect();

        for coords in [vec![], vec![origin], cluster] {
            let inference = identify_track(&coords, &config);
            assert!(inference.arc.is_none());
            assert!(inference.parallel_segments.is_empty());
            assert_eq!(inference.outcome, SearchOutcome::Exhausted);
        }
    }

    #[test]
    fn test_synthetic_oval_is_found() {
        let config = TrackConfig::default();
        let coords = OvalTrack::standard(GpsPoint::new(47.37, 8.55), 60.0).generate();
        let inference = identify_track(&coords, &config);

        let shape = inference.arc.expect("oval should be detected");
        assert!(!inference.parallel_segments.is_empty());
        assert!(matches!(inference.outcome, SearchOutcome::Accepted | SearchOutcome::Exhausted));
        assert!((shape.radii.0 - 35.0).abs() < 5.0, "radius {}", shape.radii.0);
        assert!((shape.radii.1 - 35.0).abs() < 5.0, "radius {}", shape.radii.1);
        assert!(axial_offset(shape.bearing_degrees, 60.0) < 5.0, "bearing {}", shape.bearing_degrees);
        assert!(shape.combined_fitness() > 0.0);
    }

    #[test]
    fn test_invalid_coordinates_are_skipped() {
        let config = TrackConfig::default();
        let clean = OvalTrack::standard(GpsPoint::new(47.37, 8.55), 60.0).generate();
        let mut coords = clean.clone();
        coords.insert(10, GpsPoint::new(f64::NAN, f64::NAN));
        coords.insert(200, GpsPoint::new(47.37, f64::INFINITY));
        coords.push(GpsPoint::new(120.0, 8.55));

        let inference = identify_track(&coords, &config);
        assert_eq!(inference, identify_track(&clean, &config));
        assert!(inference.arc.is_some());

        let garbage = vec![GpsPoint::new(f64::NAN, f64::NAN); 20];
        let inference = identify_track(&garbage, &config);
        assert!(inference.arc.is_none());
        assert_eq!(inference.outcome, SearchOutcome::Exhausted);
    }

    #[test]
    fn test_search_is_deterministic() {
        let config = TrackConfig::default();
        let coords = OvalTrack::standard(GpsPoint::new(-33.86, 151.21), 15.0).generate();
        assert_eq!(identify_track(&coords, &config), identify_track(&coords, &config));
    }

    #[test]
    fn test_random_walk_is_not_accepted() {
        let config = TrackConfig::default();
        let coords = random_walk(GpsPoint::new(47.37, 8.55), 2000, 3.0, 60.0, 7);
        let inference = identify_track(&coords, &config);
        assert!(inference
            .arc
            .map_or(true, |shape| shape.combined_fitness() <= config.acceptance_fitness));
    }

    #[test]
    fn test_straights_without_turns_record_pairs_only() {
        let config = TrackConfig::default();
        let oval = OvalTrack::standard(GpsPoint::new(47.37, 8.55), 60.0);
        let half = oval.straight_length / 2.0;
        let r = oval.turn_radius;
        let mut coords: Vec<GpsPoint> = (0..=50).map(|i| oval.project(-half + i as f64 * 2.0, -r)).collect();
        coords.extend((0..=50).map(|i| oval.project(half - i as f64 * 2.0, r)));

        let inference = identify_track(&coords, &config);
        assert!(!inference.parallel_segments.is_empty());
        assert!(inference.arc.is_none());
        assert_eq!(inference.outcome, SearchOutcome::Exhausted);
    }

    #[test]
    fn test_expired_deadline_reports_no_track() {
        let config = TrackConfig {
            max_duration: Some(Duration::ZERO),
            ..TrackConfig::default()
        };
        let coords = OvalTrack::standard(GpsPoint::new(47.37, 8.55), 60.0).generate();
        let inference = identify_track(&coords, &config);

        assert!(inference.arc.is_none());
        assert_eq!(inference.outcome, SearchOutcome::DeadlineExceeded);
    }

    #[test]
    fn test_cancel_flag_reports_no_track() {
        let config = TrackConfig::default();
        let coords = OvalTrack::standard(GpsPoint::new(47.37, 8.55), 60.0).generate();
        let flag = Arc::new(AtomicBool::new(true));
        let budget = SearchBudget::unlimited().with_cancel_flag(flag);

        let inference = identify_track_with_budget(&coords, &config, budget);
        assert!(inference.arc.is_none());
        assert!(inference.parallel_segments.is_empty());
        assert_eq!(inference.outcome, SearchOutcome::Cancelled);
    }

    #[test]
    fn test_budget_exhaustion() {
        assert!(!SearchBudget::unlimited().is_exhausted());
        assert!(!SearchBudget::from_config(&TrackConfig::default()).is_exhausted());

        let future = SearchBudget::unlimited().with_deadline(Instant::now() + Duration::from_secs(3600));
        assert!(!future.is_exhausted());

        let past = SearchBudget::unlimited().with_deadline(Instant::now());
        assert_eq!(past.exhaustion(), Some(SearchOutcome::DeadlineExceeded));

        // Cancellation wins when both apply
        let flag = Arc::new(AtomicBool::new(false));
        let both = past.with_cancel_flag(flag.clone());
        assert_eq!(both.exhaustion(), Some(SearchOutcome::DeadlineExceeded));
        flag.store(true, Ordering::Relaxed);
        assert_eq!(both.exhaustion(), Some(SearchOutcome::Cancelled));
    }
}
