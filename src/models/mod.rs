//! Data models for the discovery engine
//!
//! This module contains the core domain models organized by concern:
//! - Coordinate: Geographic coordinates and cache-key derivation
//! - Poi: Points of interest and their weather-enriched form
//! - Weather: Canonical weather records and condition vocabulary

pub mod coordinate;
pub mod poi;
pub mod weather;

// Re-export all public types for convenient access
pub use coordinate::{CACHE_KEY_PRECISION, Coordinate};
pub use poi::{EnrichedPoi, Poi};
pub use weather::{WeatherCondition, WeatherRecord, WeatherSource};
