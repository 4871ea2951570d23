//! End-to-end discovery pipeline tests
//!
//! Exercise the full pipeline through the library surface with a stubbed
//! weather provider and an in-memory cache: store query, distance ordering,
//! weather enrichment, preference filtering, and stage counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use niceweather::batch::{BatchWeatherResolver, DEFAULT_FETCH_CONCURRENCY};
use niceweather::cache::WeatherCache;
use niceweather::discovery::DiscoveryService;
use niceweather::distance::DistanceUnit;
use niceweather::filter::{FilterPreference, PrecipitationPref, TemperaturePref};
use niceweather::models::{Coordinate, Poi, WeatherRecord, WeatherSource};
use niceweather::poi_store::JsonPoiStore;
use niceweather::provider::WeatherFetch;

/// Deterministic provider: temperature scales with latitude so POIs laid out
/// on a latitude ladder produce a temperature ladder.
struct LadderProvider {
    calls: AtomicUsize,
}

impl LadderProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl WeatherFetch for LadderProvider {
    async fn fetch(&self, coord: &Coordinate) -> WeatherRecord {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut record = WeatherRecord::fallback();
        record.temperature_f = 40 + ((coord.lat - 44.5) * 100.0).round() as i32;
        record.source = WeatherSource::Provider;
        record
    }
}

fn poi(id: usize, lat: f64) -> Poi {
    Poi {
        id: format!("poi-{id}"),
        name: format!("Park {id}"),
        lat,
        lng: -93.26,
        category: "park".to_string(),
        description: String::new(),
        rank: id as i32,
    }
}

/// Ten POIs stepped 0.05 degrees of latitude apart, giving stub
/// temperatures 40, 45, .., 85.
fn ladder_pois() -> Vec<Poi> {
    (0..10).map(|i| poi(i, 44.5 + i as f64 * 0.05)).collect()
}

fn service(
    pois: Vec<Poi>,
    provider: Arc<LadderProvider>,
) -> (DiscoveryService, Arc<WeatherCache>) {
    let cache = Arc::new(WeatherCache::memory());
    let resolver = BatchWeatherResolver::new(
        Arc::clone(&cache),
        provider as Arc<dyn WeatherFetch>,
        Duration::from_secs(6 * 60 * 60),
        DEFAULT_FETCH_CONCURRENCY,
    );
    let service = DiscoveryService::new(
        Arc::new(JsonPoiStore::new(pois)),
        resolver,
        Arc::clone(&cache),
        DistanceUnit::Miles,
    );
    (service, cache)
}

fn center() -> Coordinate {
    Coordinate::new(44.5, -93.26).unwrap()
}

#[tokio::test]
async fn test_cold_preference_keeps_lower_forty_percentile() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());
    let pref = FilterPreference {
        temperature: Some(TemperaturePref::Cold),
        ..FilterPreference::default()
    };

    let response = service.discover(center(), 100.0, 10, &pref).await.unwrap();

    // Threshold is the 40th-percentile temperature of the ten candidates
    // (60); five candidates sit at or below it.
    assert_eq!(response.counts.candidates, 10);
    assert_eq!(response.counts.after_weather, 10);
    assert_eq!(response.counts.after_filter, 5);
    assert!(
        response
            .results
            .iter()
            .all(|p| p.weather.temperature_f <= 60)
    );
}

#[tokio::test]
async fn test_mild_preference_keeps_inner_band() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());
    let pref = FilterPreference {
        temperature: Some(TemperaturePref::Mild),
        ..FilterPreference::default()
    };

    let response = service.discover(center(), 100.0, 10, &pref).await.unwrap();

    // Band is [10th percentile, 90th percentile] = [45, 85]; only the 40°
    // candidate falls outside.
    assert_eq!(response.counts.after_filter, 9);
}

#[tokio::test]
async fn test_results_ordered_nearest_first() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());

    let response = service
        .discover(center(), 100.0, 10, &FilterPreference::default())
        .await
        .unwrap();

    let distances: Vec<f64> = response.results.iter().map(|p| p.distance_miles).collect();
    let mut sorted = distances.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(distances, sorted);
    assert_eq!(response.results[0].poi.id, "poi-0");
}

#[tokio::test]
async fn test_empty_area_returns_zero_counts_without_error() {
    let (service, _cache) = service(Vec::new(), LadderProvider::new());

    let response = service
        .discover(center(), 30.0, 10, &FilterPreference::default())
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.counts.candidates, 0);
    assert_eq!(response.counts.after_weather, 0);
    assert_eq!(response.counts.after_filter, 0);
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let provider = LadderProvider::new();
    let (service, cache) = service(ladder_pois(), Arc::clone(&provider));
    let pref = FilterPreference::default();

    service.discover(center(), 100.0, 10, &pref).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 10);

    let response = service.discover(center(), 100.0, 10, &pref).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 10, "no refetch");
    assert_eq!(cache.stats().hits, 10);
    assert_eq!(response.counts.after_weather, 10);
}

#[tokio::test]
async fn test_combined_preferences_intersect() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());
    // All stub records report 10% precipitation, so the precipitation cut
    // keeps everything and the temperature cut decides.
    let pref = FilterPreference {
        temperature: Some(TemperaturePref::Cold),
        precipitation: Some(PrecipitationPref::None),
        ..FilterPreference::default()
    };

    let response = service.discover(center(), 100.0, 10, &pref).await.unwrap();
    assert_eq!(response.counts.after_filter, 5);
}

#[tokio::test]
async fn test_limit_bounds_weather_stage() {
    let provider = LadderProvider::new();
    let (service, _cache) = service(ladder_pois(), Arc::clone(&provider));

    let response = service
        .discover(center(), 100.0, 3, &FilterPreference::default())
        .await
        .unwrap();

    // Only the three nearest candidates reach the weather stage.
    assert_eq!(response.counts.candidates, 10);
    assert_eq!(response.counts.after_weather, 3);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_invalid_radius_is_rejected() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());
    let pref = FilterPreference::default();

    assert!(service.discover(center(), 0.0, 10, &pref).await.is_err());
    assert!(service.discover(center(), -1.0, 10, &pref).await.is_err());
    assert!(
        service
            .discover(center(), f64::INFINITY, 10, &pref)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_preference_parsing_round_trip_through_pipeline() {
    let (service, _cache) = service(ladder_pois(), LadderProvider::new());
    let pref = FilterPreference::parse(Some("hot"), None, Some("")).unwrap();

    let response = service.discover(center(), 100.0, 10, &pref).await.unwrap();

    // Hot keeps candidates at or above the 60th-percentile temperature (70).
    assert_eq!(response.counts.after_filter, 4);
    assert!(
        response
            .results
            .iter()
            .all(|p| p.weather.temperature_f >= 70)
    );
}
