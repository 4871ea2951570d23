//! `niceweather` - Weather-aware point-of-interest discovery
//!
//! This library finds points of interest near a location, enriches them with
//! current weather through a TTL cache, and filters them against sparse
//! user weather preferences.

pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod distance;
pub mod error;
pub mod filter;
pub mod models;
pub mod poi_store;
pub mod provider;
pub mod web;

// Re-export core types for public API
pub use batch::BatchWeatherResolver;
pub use cache::{CacheStats, WeatherCache};
pub use config::EngineConfig;
pub use discovery::{DiscoveryCounts, DiscoveryResponse, DiscoveryService};
pub use distance::DistanceUnit;
pub use error::EngineError;
pub use filter::{FilterPreference, WeatherPreferenceFilter};
pub use models::{Coordinate, EnrichedPoi, Poi, WeatherCondition, WeatherRecord};
pub use poi_store::{JsonPoiStore, PoiStore};
pub use provider::{OpenWeatherProvider, WeatherFetch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EngineError>;
