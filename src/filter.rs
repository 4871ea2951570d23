//! Weather preference filtering
//!
//! Thresholds are computed per call, relative to the current candidate
//! population, so "cold", "mild", and "hot" stay meaningful across seasons.
//! The tradeoff is documented behavior on small candidate sets: percentile
//! cuts can over-restrict results to near-empty. That is an accepted product
//! characteristic, reported through the discovery counts rather than patched
//! here.

use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::models::EnrichedPoi;

/// Temperature preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperaturePref {
    Cold,
    Mild,
    Hot,
}

/// Precipitation preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationPref {
    None,
    Light,
    Heavy,
}

/// Wind preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindPref {
    Calm,
    Breezy,
    Windy,
}

/// Sparse user weather preferences. Each dimension is independently
/// optional; absence means no constraint on that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPreference {
    pub temperature: Option<TemperaturePref>,
    pub precipitation: Option<PrecipitationPref>,
    pub wind: Option<WindPref>,
}

impl FilterPreference {
    /// True when no dimension is constrained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.precipitation.is_none() && self.wind.is_none()
    }

    /// Normalize loose string input into the typed preference shape.
    /// Empty strings mean "no constraint"; unknown values are rejected as
    /// validation errors at this boundary so internal components only ever
    /// see the normalized form.
    pub fn parse(
        temperature: Option<&str>,
        precipitation: Option<&str>,
        wind: Option<&str>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            temperature: parse_dimension(temperature, "temperature", |value| match value {
                "cold" => Some(TemperaturePref::Cold),
                "mild" => Some(TemperaturePref::Mild),
                "hot" => Some(TemperaturePref::Hot),
                _ => None,
            })?,
            precipitation: parse_dimension(precipitation, "precipitation", |value| match value {
                "none" => Some(PrecipitationPref::None),
                "light" => Some(PrecipitationPref::Light),
                "heavy" => Some(PrecipitationPref::Heavy),
                _ => None,
            })?,
            wind: parse_dimension(wind, "wind", |value| match value {
                "calm" => Some(WindPref::Calm),
                "breezy" => Some(WindPref::Breezy),
                "windy" => Some(WindPref::Windy),
                _ => None,
            })?,
        })
    }
}

fn parse_dimension<T>(
    input: Option<&str>,
    dimension: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EngineError> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return Ok(None);
    }
    lookup(&trimmed)
        .map(Some)
        .ok_or_else(|| EngineError::validation(format!("Unknown {dimension} preference: {raw}")))
}

/// Inclusive bound pair for one weather dimension
#[derive(Debug, Clone, Copy, Default)]
struct Band {
    min: Option<i32>,
    max: Option<i32>,
}

impl Band {
    fn contains(&self, value: i32) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Population-relative weather filter
pub struct WeatherPreferenceFilter;

impl WeatherPreferenceFilter {
    /// Filter candidates by the given preferences. Ordering is preserved:
    /// the output is a stable sub-sequence of the input. Thresholds for
    /// every dimension are derived once from the full pre-filter population
    /// and the dimensions compose by intersection.
    #[must_use]
    pub fn apply(pois: Vec<EnrichedPoi>, pref: &FilterPreference) -> Vec<EnrichedPoi> {
        if pref.is_empty() || pois.is_empty() {
            return pois;
        }

        let temperature_band = pref
            .temperature
            .map(|p| temperature_band(&pois, p))
            .unwrap_or_default();
        let precipitation_band = pref
            .precipitation
            .map(|p| precipitation_band(&pois, p))
            .unwrap_or_default();
        let wind_band = pref.wind.map(|p| wind_band(&pois, p)).unwrap_or_default();

        pois.into_iter()
            .filter(|poi| {
                temperature_band.contains(poi.weather.temperature_f)
                    && precipitation_band.contains(i32::from(poi.weather.precipitation_pct))
                    && wind_band.contains(poi.weather.wind_mph)
            })
            .collect()
    }
}

/// Value at the `floor(n * pct)` index of the ascending-sorted population.
/// For n=1 every percentile selects index 0, so a single-candidate list
/// trivially passes one side of any band — intentional, not a bug.
fn percentile_value(sorted: &[i32], pct: f64) -> i32 {
    let index = ((sorted.len() as f64) * pct).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn sorted_values(pois: &[EnrichedPoi], extract: impl Fn(&EnrichedPoi) -> i32) -> Vec<i32> {
    let mut values: Vec<i32> = pois.iter().map(extract).collect();
    values.sort_unstable();
    values
}

fn temperature_band(pois: &[EnrichedPoi], pref: TemperaturePref) -> Band {
    let sorted = sorted_values(pois, |poi| poi.weather.temperature_f);
    match pref {
        TemperaturePref::Cold => Band {
            min: None,
            max: Some(percentile_value(&sorted, 0.4)),
        },
        TemperaturePref::Hot => Band {
            min: Some(percentile_value(&sorted, 0.6)),
            max: None,
        },
        TemperaturePref::Mild => Band {
            min: Some(percentile_value(&sorted, 0.1)),
            max: Some(percentile_value(&sorted, 0.9)),
        },
    }
}

fn precipitation_band(pois: &[EnrichedPoi], pref: PrecipitationPref) -> Band {
    let sorted = sorted_values(pois, |poi| i32::from(poi.weather.precipitation_pct));
    match pref {
        // Lower precipitation is favored for both "none" and "light".
        PrecipitationPref::None | PrecipitationPref::Light => Band {
            min: None,
            max: Some(percentile_value(&sorted, 0.6)),
        },
        PrecipitationPref::Heavy => Band {
            min: Some(percentile_value(&sorted, 0.7)),
            max: None,
        },
    }
}

fn wind_band(pois: &[EnrichedPoi], pref: WindPref) -> Band {
    let sorted = sorted_values(pois, |poi| poi.weather.wind_mph);
    match pref {
        WindPref::Calm => Band {
            min: None,
            max: Some(percentile_value(&sorted, 0.4)),
        },
        WindPref::Windy => Band {
            min: Some(percentile_value(&sorted, 0.6)),
            max: None,
        },
        WindPref::Breezy => Band {
            min: Some(percentile_value(&sorted, 0.1)),
            max: Some(percentile_value(&sorted, 0.9)),
        },
    }
}
