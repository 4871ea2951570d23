//! Point-of-interest models

use serde::{Deserialize, Serialize};

use super::{Coordinate, WeatherRecord};

/// An outdoor point of interest as returned by the POI store.
///
/// The store owns these rows; the engine treats them as read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    pub description: String,
    /// Externally assigned importance ordering, lower is more important.
    /// Used as a tie-breaker when distances are equal.
    pub rank: i32,
}

impl Poi {
    /// Coordinate of this POI. Store data is trusted, so no revalidation.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// A POI carrying its weather and distance from the requesting user.
/// Constructed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPoi {
    #[serde(flatten)]
    pub poi: Poi,
    pub weather: WeatherRecord,
    pub distance_miles: f64,
}
