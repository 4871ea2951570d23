//! Weather record model and canonical condition vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical weather condition vocabulary. Provider-specific condition
/// strings are mapped onto this set at fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Fog,
    Unknown,
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Drizzle => "drizzle",
            WeatherCondition::Thunderstorm => "thunderstorm",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Where a weather record came from. A fallback record is a valid,
/// displayable observation, not an error sentinel — downstream code must
/// not treat it as a failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Provider,
    Fallback,
}

/// A single weather observation attached to a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// Temperature in degrees Fahrenheit
    pub temperature_f: i32,
    /// Canonical condition
    pub condition: WeatherCondition,
    /// Human-readable description from the provider
    pub description: String,
    /// Estimated precipitation probability, 0-100
    pub precipitation_pct: u8,
    /// Wind speed in miles per hour
    pub wind_mph: i32,
    /// Provider or fallback
    pub source: WeatherSource,
    /// When this record was created
    pub observed_at: DateTime<Utc>,
}

impl WeatherRecord {
    /// The fixed pleasant-weather record substituted when the live provider
    /// is unavailable or unconfigured.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            temperature_f: 72,
            condition: WeatherCondition::Clear,
            description: "Sunny".to_string(),
            precipitation_pct: 10,
            wind_mph: 5,
            source: WeatherSource::Fallback,
            observed_at: Utc::now(),
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}\u{b0}F", self.temperature_f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_pleasant_and_displayable() {
        let record = WeatherRecord::fallback();
        assert_eq!(record.source, WeatherSource::Fallback);
        assert_eq!(record.temperature_f, 72);
        assert_eq!(record.condition, WeatherCondition::Clear);
        assert_eq!(record.precipitation_pct, 10);
        assert_eq!(record.wind_mph, 5);
        assert!(!record.description.is_empty());
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(WeatherCondition::Thunderstorm.to_string(), "thunderstorm");
        assert_eq!(WeatherCondition::Clear.to_string(), "clear");
    }
}
