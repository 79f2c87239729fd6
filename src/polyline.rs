//! Closed outline of a detected track.
//!
//! The outline is two 51-point semicircles joined by straight links, closed
//! by repeating the first point: 103 coordinates in total.

use crate::geo_utils::destination;
use crate::track::{TrackInference, TrackShape};
use crate::GpsPoint;

#[cfg(feature = "geojson")]
use crate::geo_utils::compute_bounds;

/// Subdivisions per semicircle.
const ARC_SUBDIVISIONS: u32 = 50;

/// Points on a semicircle of `radius` around `center`, starting at
/// `start_bearing` and sweeping 180° clockwise.
fn semicircle(center: &GpsPoint, radius: f64, start_bearing: f64) -> impl Iterator<Item = GpsPoint> + '_ {
    (0..=ARC_SUBDIVISIONS).map(move |i| {
        let angle = start_bearing + 180.0 * i as f64 / ARC_SUBDIVISIONS as f64;
        destination(center, angle, radius)
    })
}

impl TrackShape {
    /// Closed outline of this shape, 103 points.
    ///
    /// # Example
    ///
    /// ```rust
    /// use track_finder::{GpsPoint, TrackShape, geo_utils};
    ///
    /// let top = GpsPoint::new(47.37, 8.55);
    /// let shape = TrackShape {
    ///     mid: (top, geo_utils::destination(&top, 60.0, 100.0)),
    ///     bearing_degrees: 60.0,
    ///     radii: (35.0, 35.0),
    ///     fitness: (8.0, 9.0),
    /// };
    ///
    /// let outline = shape.to_polyline();
    /// assert_eq!(outline.len(), 103);
    /// assert_eq!(outline.first(), outline.last());
    /// ```
    pub fn to_polyline(&self) -> Vec<GpsPoint> {
        let (top, bottom) = &self.mid;
        let mut outline: Vec<GpsPoint> = semicircle(top, self.radii.0, self.bearing_degrees + 90.0)
            .chain(semicircle(bottom, self.radii.1, self.bearing_degrees - 90.0))
            .collect();

        if let Some(&first) = outline.first() {
            outline.push(first);
        }
        outline
    }
}

/// Outline of the track detected by `inference`, if any.
pub fn track_to_line(inference: Option<&TrackInference>) -> Option<Vec<GpsPoint>> {
    inference
        .and_then(|inference| inference.arc.as_ref())
        .map(TrackShape::to_polyline)
}

/// GeoJSON `Feature` with the outline as a `LineString`.
///
/// Positions are `[lng, lat]`. Properties carry the axis bearing, the
/// outline's bounding-box center, turn centers, radii and fitness.
#[cfg(feature = "geojson")]
pub fn track_to_geojson(shape: &TrackShape) -> serde_json::Value {
    let outline = shape.to_polyline();
    let coordinates: Vec<[f64; 2]> = outline.iter().map(GpsPoint::to_lng_lat).collect();
    let bounds = compute_bounds(&outline);
    let bbox = bounds.map(|b| [b.min_lng, b.min_lat, b.max_lng, b.max_lat]);
    let center = bounds.map(|b| b.center().to_lng_lat());

    serde_json::json!({
        "type": "Feature",
        "bbox": bbox,
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
        "properties": {
            "bearing_degrees": shape.bearing_degrees,
            "center": center,
            "centers": [shape.mid.0.to_lng_lat(), shape.mid.1.to_lng_lat()],
            "radii": [shape.radii.0, shape.radii.1],
            "fitness": [shape.fitness.0, shape.fitness.1],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::haversine_distance;
    use crate::SearchOutcome;
    use std::f64::consts::PI;

    fn shape(bearing: f64, radii: (f64, f64)) -> TrackShape {
        let top = GpsPoint::new(47.37, 8.55);
        TrackShape {
            mid: (top, destination(&top, bearing, 100.0)),
            bearing_degrees: bearing,
            radii,
            fitness: (7.5, 6.0),
        }
    }

    #[test]
    fn test_outline_is_closed() {
        let outline = shape(60.0, (35.0, 35.0)).to_polyline();
        assert_eq!(outline.len(), 103);
        assert_eq!(outline[0], outline[102]);
    }

    #[test]
    fn test_arc_steps_are_bounded() {
        let s = shape(-120.0, (35.0, 30.0));
        let outline = s.to_polyline();

        for (range, radius) in [(0..51, s.radii.0), (51..102, s.radii.1)] {
            let max_step = 2.0 * radius * (PI / 100.0).sin() + 1e-3;
            let arc = &outline[range];
            assert!(arc.windows(2).all(|w| haversine_distance(&w[0], &w[1]) <= max_step));
        }
    }

    #[test]
    fn test_straight_links_match_center_separation() {
        let s = shape(15.0, (35.0, 35.0));
        let outline = s.to_polyline();
        let separation = haversine_distance(&s.mid.0, &s.mid.1);

        // Top arc end to bottom arc start, and bottom arc end back to the start
        assert!((haversine_distance(&outline[50], &outline[51]) - separation).abs() < 0.05);
        assert!((haversine_distance(&outline[101], &outline[102]) - separation).abs() < 0.05);
    }

    #[test]
    fn test_outline_is_idempotent() {
        let s = shape(200.0, (33.0, 36.0));
        assert_eq!(s.to_polyline(), s.to_polyline());
    }

    #[test]
    fn test_track_to_line_absent() {
        assert!(track_to_line(None).is_none());

        let empty = TrackInference {
            arc: None,
            parallel_segments: Vec::new(),
            outcome: SearchOutcome::Exhausted,
        };
        assert!(track_to_line(Some(&empty)).is_none());

        let found = TrackInference {
            arc: Some(shape(60.0, (35.0, 35.0))),
            ..empty
        };
        assert_eq!(track_to_line(Some(&found)).map(|line| line.len()), Some(103));
    }

    #[cfg(feature = "geojson")]
    #[test]
    fn test_geojson_feature() {
        let s = shape(60.0, (35.0, 35.0));
        let feature = track_to_geojson(&s);

        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "LineString");
        let coordinates = feature["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(coordinates.len(), 103);
        assert_eq!(coordinates[0], coordinates[102]);
        assert_eq!(feature["bbox"].as_array().unwrap().len(), 4);
        assert_eq!(feature["properties"]["radii"][0], 35.0);
        assert_eq!(feature["properties"]["bearing_degrees"], 60.0);

        // Bounding-box center sits between the two turn centers
        let center = feature["properties"]["center"].as_array().unwrap();
        let center = GpsPoint::new(center[1].as_f64().unwrap(), center[0].as_f64().unwrap());
        let between = crate::geo_utils::midpoint(&s.mid.0, &s.mid.1);
        assert!(haversine_distance(&center, &between) < 0.5);
    }
}
