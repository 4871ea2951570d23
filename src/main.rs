use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use niceweather::api::AppState;
use niceweather::batch::BatchWeatherResolver;
use niceweather::cache::WeatherCache;
use niceweather::config::EngineConfig;
use niceweather::discovery::DiscoveryService;
use niceweather::distance::DistanceUnit;
use niceweather::poi_store::JsonPoiStore;
use niceweather::provider::OpenWeatherProvider;
use niceweather::web;

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cache = Arc::new(WeatherCache::from_config(&config.cache)?);
    let provider = Arc::new(OpenWeatherProvider::new(&config.weather)?);
    let resolver = BatchWeatherResolver::new(
        Arc::clone(&cache),
        provider,
        Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600),
        config.discovery.fetch_concurrency as usize,
    );

    let store = Arc::new(JsonPoiStore::load_or_empty(&config.discovery.poi_dataset));
    tracing::info!("POI catalog loaded with {} entries", store.len());

    let unit = match config.discovery.distance_unit.as_str() {
        "kilometers" => DistanceUnit::Kilometers,
        _ => DistanceUnit::Miles,
    };
    let service = Arc::new(DiscoveryService::new(store, resolver, Arc::clone(&cache), unit));

    let state = AppState {
        service,
        defaults: config.discovery.clone(),
    };

    web::run(state, config.server.port).await
}
