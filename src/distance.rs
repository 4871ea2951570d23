//! Great-circle distance between coordinates
//!
//! The single shared distance implementation. Every consumer — the POI store
//! radius query and the discovery ranking — goes through this function, so
//! the Haversine parameters live in exactly one place.

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;

/// Unit the Haversine result is expressed in. Selected once from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    fn to_haversine(self) -> haversine::Units {
        match self {
            DistanceUnit::Miles => haversine::Units::Miles,
            DistanceUnit::Kilometers => haversine::Units::Kilometers,
        }
    }
}

/// Great-circle distance between two coordinates. Pure, no I/O, cannot fail
/// for any valid coordinate pair.
#[must_use]
pub fn distance_between(a: &Coordinate, b: &Coordinate, unit: DistanceUnit) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: a.lat,
            longitude: a.lng,
        },
        haversine::Location {
            latitude: b.lat,
            longitude: b.lng,
        },
        unit.to_haversine(),
    )
}

/// Distance in miles, the engine's default unit
#[must_use]
pub fn distance_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    distance_between(a, b, DistanceUnit::Miles)
}
