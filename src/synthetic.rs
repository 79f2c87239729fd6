//! Synthetic recordings for demos, benchmarks and tests.
//!
//! [`OvalTrack`] traces an ideal running track lap after lap, optionally with
//! uniform positional jitter. [`random_walk`] produces a recording with no
//! track in it. Both are seeded and fully deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::geo_utils::destination;
use crate::GpsPoint;

/// An ideal oval: two straights joined by two semicircular turns.
///
/// Local frame: `x` runs along `bearing_degrees`, `y` along
/// `bearing_degrees + 90`, both in meters from `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct OvalTrack {
    pub center: GpsPoint,
    /// Direction of the straights
    pub bearing_degrees: f64,
    pub straight_length: f64,
    pub turn_radius: f64,
    /// Distance between consecutive coordinates along the lap
    pub spacing: f64,
    pub laps: u32,
    /// Maximum positional noise per axis, 0 for none
    pub jitter_m: f64,
    pub seed: u64,
}

impl OvalTrack {
    /// 100m straights, 35m turns, a coordinate every 2m, three clean laps.
    pub fn standard(center: GpsPoint, bearing_degrees: f64) -> Self {
        Self {
            center,
            bearing_degrees,
            straight_length: 100.0,
            turn_radius: 35.0,
            spacing: 2.0,
            laps: 3,
            jitter_m: 0.0,
            seed: 0,
        }
    }

    /// Add uniform noise of up to `jitter_m` per axis.
    pub fn with_jitter(mut self, jitter_m: f64, seed: u64) -> Self {
        self.jitter_m = jitter_m;
        self.seed = seed;
        self
    }

    /// Length of one lap in meters.
    pub fn lap_length(&self) -> f64 {
        2.0 * self.straight_length + 2.0 * PI * self.turn_radius
    }

    /// Map local `(x, y)` meters to a GPS coordinate.
    pub fn project(&self, x: f64, y: f64) -> GpsPoint {
        let along = destination(&self.center, self.bearing_degrees, x);
        destination(&along, self.bearing_degrees + 90.0, y)
    }

    /// Local position `distance` meters into a lap, starting at the beginning
    /// of the first straight.
    fn local_position(&self, distance: f64) -> (f64, f64) {
        let half = self.straight_length / 2.0;
        let r = self.turn_radius;
        let turn = PI * r;
        let s = distance.rem_euclid(self.lap_length());

        if s < self.straight_length {
            (-half + s, -r)
        } else if s < self.straight_length + turn {
            let theta = (s - self.straight_length) / r;
            (half + r * theta.sin(), -r * theta.cos())
        } else if s < 2.0 * self.straight_length + turn {
            (half - (s - self.straight_length - turn), r)
        } else {
            let theta = (s - 2.0 * self.straight_length - turn) / r;
            (-half - r * theta.sin(), r * theta.cos())
        }
    }

    /// Coordinates along every lap, in running order.
    pub fn generate(&self) -> Vec<GpsPoint> {
        if self.spacing <= 0.0 || self.laps == 0 {
            return Vec::new();
        }

        let total = self.lap_length() * self.laps as f64;
        let count = (total / self.spacing).floor() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..count)
            .map(|i| {
                let (mut x, mut y) = self.local_position(i as f64 * self.spacing);
                if self.jitter_m > 0.0 {
                    x += rng.gen_range(-self.jitter_m..=self.jitter_m);
                    y += rng.gen_range(-self.jitter_m..=self.jitter_m);
                }
                self.project(x, y)
            })
            .collect()
    }
}

/// A wandering recording: `steps` moves of `step_m` meters, each turning by
/// up to `max_turn_degrees` either way.
pub fn random_walk(
    origin: GpsPoint,
    steps: usize,
    step_m: f64,
    max_turn_degrees: f64,
    seed: u64,
) -> Vec<GpsPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut heading: f64 = rng.gen_range(0.0..360.0);
    let mut current = origin;
    let mut points = Vec::with_capacity(steps + 1);
    points.push(current);

    for _ in 0..steps {
        if max_turn_degrees > 0.0 {
            heading += rng.gen_range(-max_turn_degrees..=max_turn_degrees);
        }
        current = destination(&current, heading, step_m);
        points.push(current);
    }

    points
}
