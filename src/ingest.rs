//! Turning raw position records into coordinates.
//!
//! Recordings often carry samples without a fix (indoor starts, tunnels,
//! sensor-only records). Only complete, valid positions reach detection.

use log::debug;

use crate::GpsPoint;

/// One sample from a recording; either coordinate may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRecord {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl PositionRecord {
    pub fn new(longitude: Option<f64>, latitude: Option<f64>) -> Self {
        Self { longitude, latitude }
    }

    /// The position, if both fields are present and valid.
    pub fn to_point(&self) -> Option<GpsPoint> {
        let point = GpsPoint::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }
}

/// Keep records with a complete, valid position, in order.
///
/// # Example
///
/// ```rust
/// use track_finder::{PositionRecord, coordinates_from_records};
///
/// let records = vec![
///     PositionRecord::new(Some(8.55), Some(47.37)),
///     PositionRecord::new(None, Some(47.38)),
///     PositionRecord::new(Some(8.56), Some(f64::NAN)),
/// ];
/// let coords = coordinates_from_records(&records);
/// assert_eq!(coords.len(), 1);
/// assert_eq!(coords[0].latitude, 47.37);
/// ```
pub fn coordinates_from_records(records: &[PositionRecord]) -> Vec<GpsPoint> {
    let coords: Vec<GpsPoint> = records.iter().filter_map(PositionRecord::to_point).collect();
    if coords.len() < records.len() {
        debug!(
            "[Ingest] Dropped {} of {} records without a valid position",
            records.len() - coords.len(),
            records.len()
        );
    }
    coords
}

/// Keep valid `[lng, lat]` pairs, in order.
pub fn coordinates_from_lng_lat(pairs: &[[f64; 2]]) -> Vec<GpsPoint> {
    pairs
        .iter()
        .map(|&pair| GpsPoint::from_lng_lat(pair))
        .filter(GpsPoint::is_valid)
        .collect()
}
