//! R-tree spatial index over the recorded coordinates.
//!
//! Points are stored as unit-sphere `[x, y, z]` vectors so the tree can prune
//! by envelope anywhere on the globe, including across the antimeridian and
//! at the poles. Every distance reported to callers is a haversine distance
//! in meters. Queries collect the points inside a cube whose half-width is
//! the chord of the search radius, then filter and order them exactly.
//!
//! Coordinates that fail [`GpsPoint::is_valid`] are never indexed.

use rstar::{RTree, RTreeObject, AABB};
use std::cmp::Ordering;

use crate::geo_utils::{chord_length, haversine_distance, unit_vector};
use crate::GpsPoint;

/// A GPS point with its index for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    xyz: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

/// A coordinate returned by [`CoordinateIndex::nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the coordinate slice the index was built from
    pub index: usize,
    /// The coordinate itself
    pub point: GpsPoint,
    /// Haversine distance from the query point in meters
    pub distance: f64,
}

/// Nearest-neighbour index over a fixed set of coordinates.
///
/// Built once per inference call and read-only afterwards, so it can be
/// shared between threads without synchronization.
///
/// # Example
///
/// ```rust
/// use track_finder::{GpsPoint, spatial::CoordinateIndex};
///
/// let points = vec![
///     GpsPoint::new(51.50000, -0.1278),
///     GpsPoint::new(51.50002, -0.1278), // ~2m north
///     GpsPoint::new(51.50100, -0.1278), // ~111m north
/// ];
/// let index = CoordinateIndex::build(&points);
///
/// let near = index.nearest(&points[0], 10, 7.0);
/// assert_eq!(near.len(), 2);
/// assert_eq!(near[0].index, 0);
/// ```
#[derive(Debug, Clone)]
pub struct CoordinateIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<GpsPoint>,
}

impl CoordinateIndex {
    /// Bulk-load an index over `points`, skipping invalid coordinates.
    ///
    /// Neighbour indices still refer to positions in `points`.
    pub fn build(points: &[GpsPoint]) -> Self {
        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid())
            .map(|(i, p)| IndexedPoint {
                idx: i,
                xyz: unit_vector(p),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            points: points.to_vec(),
        }
    }

    /// Number of indexed (valid) coordinates.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// True if the index holds no coordinates.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Up to `k` coordinates strictly closer than `max_radius` meters to
    /// `point`, nearest first. Equal distances are ordered by input index.
    pub fn nearest(&self, point: &GpsPoint, k: usize, max_radius: f64) -> Vec<Neighbor> {
        if k == 0 || max_radius.is_nan() || max_radius <= 0.0 || !point.is_valid() || self.is_empty() {
            return Vec::new();
        }

        // Chord grows monotonically with great-circle distance, pad for rounding
        let [x, y, z] = unit_vector(point);
        let half = chord_length(max_radius) * 1.01;
        let envelope = AABB::from_corners([x - half, y - half, z - half], [x + half, y + half, z + half]);

        let mut found: Vec<Neighbor> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter_map(|candidate| {
                let stored = self.points[candidate.idx];
                let distance = haversine_distance(point, &stored);
                (distance < max_radius).then_some(Neighbor {
                    index: candidate.idx,
                    point: stored,
                    distance,
                })
            })
            .collect();

        found.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        found.truncate(k);
        found
    }
}
