//! Data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point on the earth's surface, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub latitude: f32,
    pub longitude: f32,
}

impl GeoPoint {
    pub fn new(latitude: f32, longitude: f32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in metres
    ///
    /// `self` takes the role of the recorded position and `other` the
    /// role of the target, see [`crate::nearest::haversine_distance`].
    pub fn distance_to(self, other: GeoPoint) -> f64 {
        crate::nearest::haversine_distance(self, other)
    }
}

/// Vehicle position record, as stored in the position log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord {
    /// Vehicle identifier
    pub vehicle_id: i32,
    /// Registration plate; never contains NUL
    pub registration: String,
    /// First coordinate of the record, in decimal degrees
    pub latitude: f32,
    /// Second coordinate of the record, in decimal degrees
    pub longitude: f32,
    /// Time the position was recorded
    pub recorded_at: DateTime<Utc>,
}

impl PositionRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Fixed coordinate to search around
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Ordinal label of the point, 1-based in the default set
    pub position: u32,
    pub latitude: f32,
    pub longitude: f32,
}

impl ReferencePoint {
    pub fn new(position: u32, latitude: f32, longitude: f32) -> Self {
        Self {
            position,
            latitude,
            longitude,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// The ten reference coordinates used when none are configured
    pub fn defaults() -> Vec<ReferencePoint> {
        [
            (34.544909, -102.100843),
            (32.345544, -99.123124),
            (33.234235, -100.214124),
            (35.195739, -95.348899),
            (31.895839, -97.789573),
            (32.895839, -101.789573),
            (34.115839, -100.225732),
            (32.335839, -99.992232),
            (33.535339, -94.792232),
            (32.234235, -100.222222),
        ]
        .into_iter()
        .zip(1..)
        .map(|((latitude, longitude), position)| Self::new(position, latitude, longitude))
        .collect()
    }
}
