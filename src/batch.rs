//! Cache-first batch weather resolution
//!
//! Given a list of coordinates, partitions them into cache hits and misses,
//! fetches the misses with a bounded concurrent fan-out, repopulates the
//! cache, and returns one record per input coordinate in the original order.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use rand::RngExt;
use tracing::{debug, instrument};

use crate::cache::WeatherCache;
use crate::models::{Coordinate, WeatherRecord, WeatherSource};
use crate::provider::WeatherFetch;

/// Default fan-out width for provider fetches. Bounds pressure on the
/// rate-limited external API while still parallelizing a batch.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Resolves weather for a batch of coordinates through the cache
pub struct BatchWeatherResolver {
    cache: Arc<WeatherCache>,
    provider: Arc<dyn WeatherFetch>,
    ttl: Duration,
    concurrency: usize,
}

impl BatchWeatherResolver {
    /// Create a resolver with an injected cache and provider
    #[must_use]
    pub fn new(
        cache: Arc<WeatherCache>,
        provider: Arc<dyn WeatherFetch>,
        ttl: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            cache,
            provider,
            ttl,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve one weather record per coordinate, same length and order as
    /// the input. An individual provider failure yields that coordinate's
    /// fallback record and never aborts the batch.
    #[instrument(skip(self, coords), fields(count = coords.len()))]
    pub async fn resolve(&self, coords: &[Coordinate]) -> Vec<WeatherRecord> {
        if coords.is_empty() {
            return Vec::new();
        }

        let keys: Vec<String> = coords.iter().map(Coordinate::cache_key).collect();
        let cached = self.cache.get_batch(&keys).await;

        let mut records: Vec<Option<WeatherRecord>> =
            keys.iter().map(|key| cached.get(key).cloned()).collect();

        let misses: Vec<(usize, Coordinate)> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_none())
            .map(|(index, _)| (index, coords[index]))
            .collect();

        debug!(
            "{} cache hits, {} misses",
            coords.len() - misses.len(),
            misses.len()
        );

        if !misses.is_empty() {
            let provider = &self.provider;
            let fetched: Vec<(usize, WeatherRecord)> = stream::iter(misses)
                .map(|(index, coord)| {
                    let provider = Arc::clone(provider);
                    async move { (index, provider.fetch(&coord).await) }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            // Fallback records are not cached: a coordinate that degraded
            // this request gets a fresh provider attempt next request.
            let entries: Vec<(String, WeatherRecord)> = fetched
                .iter()
                .filter(|(_, record)| record.source == WeatherSource::Provider)
                .map(|(index, record)| (keys[*index].clone(), record.clone()))
                .collect();
            if !entries.is_empty() {
                self.cache.set_batch(&entries, self.jittered_ttl()).await;
            }

            for (index, record) in fetched {
                records[index] = Some(record);
            }
        }

        records
            .into_iter()
            .map(|record| record.unwrap_or_else(WeatherRecord::fallback))
            .collect()
    }

    /// TTL with ±10% jitter so a batch written together does not expire
    /// together.
    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        Duration::from_secs_f64(self.ttl.as_secs_f64() * jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider stub: records with temperature derived from latitude, and a
    /// configurable set of cache keys that simulate provider failure.
    struct StubProvider {
        failing_keys: HashSet<String>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                failing_keys: HashSet::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_for(coords: &[Coordinate]) -> Self {
            Self {
                failing_keys: coords.iter().map(Coordinate::cache_key).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WeatherFetch for StubProvider {
        async fn fetch(&self, coord: &Coordinate) -> WeatherRecord {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_keys.contains(&coord.cache_key()) {
                return WeatherRecord::fallback();
            }
            let mut record = WeatherRecord::fallback();
            record.temperature_f = coord.lat.round() as i32;
            record.source = WeatherSource::Provider;
            record
        }
    }

    fn resolver(provider: StubProvider) -> (BatchWeatherResolver, Arc<WeatherCache>) {
        let cache = Arc::new(WeatherCache::memory());
        let resolver = BatchWeatherResolver::new(
            Arc::clone(&cache),
            Arc::new(provider),
            Duration::from_secs(6 * 60 * 60),
            DEFAULT_FETCH_CONCURRENCY,
        );
        (resolver, cache)
    }

    fn coords(pairs: &[(f64, f64)]) -> Vec<Coordinate> {
        pairs
            .iter()
            .map(|(lat, lng)| Coordinate::new(*lat, *lng).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_resolve_preserves_length_and_order() {
        let (resolver, _cache) = resolver(StubProvider::new());
        let input = coords(&[(10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);

        let records = resolver.resolve(&input).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].temperature_f, 10);
        assert_eq!(records[1].temperature_f, 20);
        assert_eq!(records[2].temperature_f, 30);
    }

    #[tokio::test]
    async fn test_resolve_empty_input() {
        let (resolver, _cache) = resolver(StubProvider::new());
        assert!(resolver.resolve(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_individual_failure_yields_fallback_without_aborting() {
        let input = coords(&[(10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
        let (resolver, _cache) = resolver(StubProvider::failing_for(&input[1..2]));

        let records = resolver.resolve(&input).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source, WeatherSource::Provider);
        assert_eq!(records[1].source, WeatherSource::Fallback);
        assert_eq!(records[2].source, WeatherSource::Provider);
    }

    #[tokio::test]
    async fn test_second_resolve_hits_cache() {
        let provider = StubProvider::new();
        let cache = Arc::new(WeatherCache::memory());
        let provider = Arc::new(provider);
        let resolver = BatchWeatherResolver::new(
            Arc::clone(&cache),
            Arc::clone(&provider) as Arc<dyn WeatherFetch>,
            Duration::from_secs(60),
            DEFAULT_FETCH_CONCURRENCY,
        );
        let input = coords(&[(10.0, 0.0), (20.0, 0.0)]);

        resolver.resolve(&input).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        resolver.resolve(&input).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2, "no refetch");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_nearby_coordinates_collapse_onto_one_entry() {
        let provider = Arc::new(StubProvider::new());
        let cache = Arc::new(WeatherCache::memory());
        let resolver = BatchWeatherResolver::new(
            Arc::clone(&cache),
            Arc::clone(&provider) as Arc<dyn WeatherFetch>,
            Duration::from_secs(60),
            DEFAULT_FETCH_CONCURRENCY,
        );

        resolver
            .resolve(&coords(&[(44.95, -93.10)]))
            .await;
        // Within 2-decimal rounding of the first coordinate.
        resolver
            .resolve(&coords(&[(44.951, -93.099)]))
            .await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_records_are_not_cached() {
        let input = coords(&[(10.0, 0.0)]);
        let provider = Arc::new(StubProvider::failing_for(&input));
        let cache = Arc::new(WeatherCache::memory());
        let resolver = BatchWeatherResolver::new(
            Arc::clone(&cache),
            Arc::clone(&provider) as Arc<dyn WeatherFetch>,
            Duration::from_secs(60),
            DEFAULT_FETCH_CONCURRENCY,
        );

        resolver.resolve(&input).await;
        resolver.resolve(&input).await;

        // The failed coordinate is retried on the second request.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
