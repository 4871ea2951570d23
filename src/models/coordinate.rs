//! Coordinate value type and cache-key derivation

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Decimal places used when rounding coordinates into cache keys. Nearby
/// requests collapse onto the same entry on purpose: at two decimals a key
/// covers roughly a kilometre, which is well inside the relevance window of
/// a weather observation.
pub const CACHE_KEY_PRECISION: u32 = 2;

/// Immutable geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in decimal degrees, [-180, 180]
    pub lng: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(lat: f64, lng: f64) -> Result<Self, EngineError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(EngineError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(EngineError::validation(format!(
                "Longitude must be between -180 and 180, got: {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(2));
        let lat = (self.lat * multiplier).round() / multiplier;
        let lng = (self.lng * multiplier).round() / multiplier;
        (lat, lng)
    }

    /// Generate the weather cache key for this coordinate
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lng) = self.rounded(CACHE_KEY_PRECISION);
        format!("weather:{lat:.2}:{lng:.2}")
    }

    /// Format coordinate as a display string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}
