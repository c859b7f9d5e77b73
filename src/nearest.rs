//! Nearest position search by great-circle distance

use std::f64::consts::PI;

use crate::{
    errors::LocatorError,
    models::{GeoPoint, PositionRecord, ReferencePoint},
};

/// Mean earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

/// Haversine distance in metres on a spherical earth
///
/// `from` is the recorded position and `to` the target. Coordinate
/// differences are taken in single precision before widening, so swapping
/// the arguments gives the same distance up to rounding.
pub fn haversine_distance(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = degrees_to_radians(from.latitude.into());
    let lat2 = degrees_to_radians(to.latitude.into());
    let delta_lat = degrees_to_radians((to.latitude - from.latitude).into());
    let delta_lon = degrees_to_radians((to.longitude - from.longitude).into());

    let a = (delta_lat / 2.0).sin() * (delta_lat / 2.0).sin()
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin() * (delta_lon / 2.0).sin();
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// A record together with its distance from a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    pub record: &'a PositionRecord,
    pub distance_m: f64,
}

/// Neighbours found for one reference point, closest first
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub reference: ReferencePoint,
    pub neighbors: Vec<Neighbor<'a>>,
}

/// Linear-scan nearest neighbour search over decoded records
#[derive(Debug, Clone, Copy)]
pub struct NearestFinder<'a> {
    records: &'a [PositionRecord],
}

impl<'a> NearestFinder<'a> {
    pub fn new(records: &'a [PositionRecord]) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `k` records closest to `target`, ascending by distance
    ///
    /// Records at equal distance keep their input order and records with
    /// an undefined (NaN) distance sort last. Returns `min(k, len)`
    /// neighbours.
    pub fn nearest(
        &self,
        target: GeoPoint,
        k: usize,
    ) -> Result<Vec<Neighbor<'a>>, LocatorError> {
        if k == 0 {
            return Err(LocatorError::InvalidCount(k));
        }
        if self.records.is_empty() {
            return Err(LocatorError::NoRecordsError);
        }

        let mut neighbors: Vec<Neighbor<'a>> = self
            .records
            .iter()
            .map(|record| Neighbor {
                record,
                distance_m: haversine_distance(record.point(), target),
            })
            .collect();

        // sort_by is stable
        neighbors.sort_by(|a, b| {
            a.distance_m
                .is_nan()
                .cmp(&b.distance_m.is_nan())
                .then(a.distance_m.total_cmp(&b.distance_m))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    pub fn query(
        &self,
        reference: &ReferencePoint,
        k: usize,
    ) -> Result<QueryResult<'a>, LocatorError> {
        Ok(QueryResult {
            reference: *reference,
            neighbors: self.nearest(reference.point(), k)?,
        })
    }

    /// Run one query per reference point, in the given order
    pub fn query_all(
        &self,
        references: &[ReferencePoint],
        k: usize,
    ) -> Result<Vec<QueryResult<'a>>, LocatorError> {
        references
            .iter()
            .map(|reference| self.query(reference, k))
            .collect()
    }
}
