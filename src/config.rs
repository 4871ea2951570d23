//! Configuration management for the discovery engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::EngineError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the discovery engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Discovery pipeline settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API key; absent or placeholder means every fetch uses the
    /// fallback record
    pub api_key: Option<String>,
    /// Base URL for the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend: "memory" or "persistent"
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Store location for the persistent backend
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Discovery pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Default search radius in miles
    #[serde(default = "default_radius_miles")]
    pub default_radius_miles: f64,
    /// Default maximum number of results
    #[serde(default = "default_max_results")]
    pub default_max_results: u32,
    /// Concurrent weather fetches per batch
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: u32,
    /// Distance unit: "miles" or "kilometers"
    #[serde(default = "default_distance_unit")]
    pub distance_unit: String,
    /// Path to the POI dataset file
    #[serde(default = "default_poi_dataset")]
    pub poi_dataset: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_timeout() -> u32 {
    5
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_cache_location() -> String {
    "~/.cache/niceweather".to_string()
}

fn default_radius_miles() -> f64 {
    30.0
}

fn default_max_results() -> u32 {
    30
}

fn default_fetch_concurrency() -> u32 {
    5
}

fn default_distance_unit() -> String {
    "miles".to_string()
}

fn default_poi_dataset() -> String {
    "data/pois.json".to_string()
}

fn default_server_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_radius_miles: default_radius_miles(),
            default_max_results: default_max_results(),
            fetch_concurrency: default_fetch_concurrency(),
            distance_unit: default_distance_unit(),
            poi_dataset: default_poi_dataset(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with NICEWEATHER_ prefix
        builder = builder.add_source(
            Environment::with_prefix("NICEWEATHER")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: EngineConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("niceweather").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 5 {
            return Err(EngineError::config(
                "Weather API timeout must be between 1 and 5 seconds",
            )
            .into());
        }

        if self.cache.ttl_hours == 0 || self.cache.ttl_hours > 168 {
            return Err(EngineError::config(
                "Cache TTL must be between 1 and 168 hours (1 week)",
            )
            .into());
        }

        if !self.discovery.default_radius_miles.is_finite()
            || self.discovery.default_radius_miles <= 0.0
            || self.discovery.default_radius_miles > 500.0
        {
            return Err(EngineError::config(
                "Default search radius must be between 0 and 500 miles",
            )
            .into());
        }

        if self.discovery.default_max_results == 0 || self.discovery.default_max_results > 100 {
            return Err(
                EngineError::config("Default max results must be between 1 and 100").into(),
            );
        }

        if self.discovery.fetch_concurrency == 0 || self.discovery.fetch_concurrency > 32 {
            return Err(
                EngineError::config("Fetch concurrency must be between 1 and 32").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_backends = ["memory", "persistent"];
        if !valid_backends.contains(&self.cache.backend.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid cache backend '{}'. Must be one of: {}",
                self.cache.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        let valid_units = ["miles", "kilometers"];
        if !valid_units.contains(&self.discovery.distance_unit.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid distance unit '{}'. Must be one of: {}",
                self.discovery.distance_unit,
                valid_units.join(", ")
            ))
            .into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(EngineError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(
            config.weather.base_url,
            "https://api.openweathermap.org/data/2.5"
        );
        assert_eq!(config.weather.timeout_seconds, 5);
        assert_eq!(config.cache.ttl_hours, 6);
        assert_eq!(config.cache.backend, "memory");
        assert_eq!(config.discovery.fetch_concurrency, 5);
        assert_eq!(config.discovery.distance_unit, "miles");
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_timeout_cap() {
        let mut config = EngineConfig::default();
        config.weather.timeout_seconds = 30; // Above the 5s provider cap
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_config_validation_invalid_backend() {
        let mut config = EngineConfig::default();
        config.cache.backend = "redis".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cache backend"));
    }

    #[test]
    fn test_config_validation_invalid_unit() {
        let mut config = EngineConfig::default();
        config.discovery.distance_unit = "furlongs".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = EngineConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_radius_range() {
        let mut config = EngineConfig::default();
        config.discovery.default_radius_miles = 1000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = EngineConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("niceweather"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
