//! Weather provider client for OpenWeatherMap
//!
//! Wraps the third-party current-weather endpoint behind the [`WeatherFetch`]
//! trait. The contract is that `fetch` never fails: a missing or placeholder
//! credential, a timeout, a non-2xx status, or an unparseable body all
//! resolve to the documented fallback record instead of an error.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::models::{Coordinate, WeatherCondition, WeatherRecord, WeatherSource};

/// Placeholder credential shipped in sample configs; treated as unconfigured
pub const PLACEHOLDER_API_KEY: &str = "your_openweather_api_key_here";

/// Single-coordinate weather lookup. Implementations must be infallible:
/// any internal failure resolves to a fallback record.
#[async_trait]
pub trait WeatherFetch: Send + Sync {
    async fn fetch(&self, coord: &Coordinate) -> WeatherRecord;
}

/// OpenWeatherMap current weather client
pub struct OpenWeatherProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// Current weather payload from OpenWeatherMap (imperial units)
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    weather: Vec<ConditionEntry>,
    main: MainEntry,
    wind: Option<WindEntry>,
    rain: Option<PrecipitationEntry>,
    snow: Option<PrecipitationEntry>,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainEntry {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WindEntry {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct PrecipitationEntry {
    /// Volume for the last hour in mm
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OpenWeatherProvider {
    /// Create a new provider client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("niceweather/0.1.0")
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn credential(&self) -> Option<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Some(key),
            _ => None,
        }
    }

    async fn fetch_current(&self, coord: &Coordinate, api_key: &str) -> Result<WeatherRecord> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=imperial",
            self.base_url, coord.lat, coord.lng, api_key
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("weather API returned {status}");
        }

        let current: CurrentResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse weather response")?;

        Ok(record_from_response(&current))
    }
}

#[async_trait]
impl WeatherFetch for OpenWeatherProvider {
    async fn fetch(&self, coord: &Coordinate) -> WeatherRecord {
        let Some(api_key) = self.credential() else {
            debug!("weather API key missing or placeholder, using fallback record");
            return WeatherRecord::fallback();
        };

        match self.fetch_current(coord, api_key).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "weather fetch failed for {}: {e:#}, using fallback record",
                    coord.format()
                );
                WeatherRecord::fallback()
            }
        }
    }
}

fn record_from_response(current: &CurrentResponse) -> WeatherRecord {
    let (condition, description) = current
        .weather
        .first()
        .map(|entry| {
            (
                condition_from_provider(&entry.main),
                entry.description.clone(),
            )
        })
        .unwrap_or((WeatherCondition::Unknown, "Unknown".to_string()));

    let explicit_volume_mm = current
        .rain
        .as_ref()
        .and_then(|p| p.one_hour)
        .or_else(|| current.snow.as_ref().and_then(|p| p.one_hour));

    WeatherRecord {
        temperature_f: current.main.temp.round() as i32,
        condition,
        description,
        precipitation_pct: estimate_precipitation_pct(condition, explicit_volume_mm),
        wind_mph: current
            .wind
            .as_ref()
            .map(|w| w.speed.round() as i32)
            .unwrap_or(0),
        source: WeatherSource::Provider,
        observed_at: Utc::now(),
    }
}

/// Map the provider's condition vocabulary onto the canonical enum
fn condition_from_provider(main: &str) -> WeatherCondition {
    match main.to_lowercase().as_str() {
        "clear" => WeatherCondition::Clear,
        "clouds" => WeatherCondition::Cloudy,
        "rain" => WeatherCondition::Rain,
        "drizzle" => WeatherCondition::Drizzle,
        "thunderstorm" => WeatherCondition::Thunderstorm,
        "snow" => WeatherCondition::Snow,
        "mist" | "fog" | "haze" | "smoke" => WeatherCondition::Fog,
        _ => WeatherCondition::Unknown,
    }
}

/// Estimate precipitation probability: explicit volume when the provider
/// reports one, otherwise a condition-based heuristic.
fn estimate_precipitation_pct(condition: WeatherCondition, volume_mm: Option<f64>) -> u8 {
    if let Some(mm) = volume_mm {
        return (mm * 10.0).clamp(0.0, 100.0).round() as u8;
    }

    match condition {
        WeatherCondition::Thunderstorm => 90,
        WeatherCondition::Snow => 85,
        WeatherCondition::Rain | WeatherCondition::Drizzle => 80,
        WeatherCondition::Cloudy => 20,
        _ => 10,
    }
}
