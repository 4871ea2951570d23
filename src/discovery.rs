//! Discovery pipeline
//!
//! Orchestrates one request end to end: validate the inputs, query the POI
//! store, sort by distance, truncate, resolve weather through the cache, and
//! apply the preference filter. Each stage's population count is carried into
//! the response so callers can see where candidates dropped out.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::EngineError;
use crate::batch::BatchWeatherResolver;
use crate::cache::{CacheStats, WeatherCache};
use crate::distance::{DistanceUnit, distance_between};
use crate::filter::{FilterPreference, WeatherPreferenceFilter};
use crate::models::{Coordinate, EnrichedPoi, Poi};
use crate::poi_store::PoiStore;

/// Cap on candidates entering the weather stage, bounding provider fan-out
/// for dense areas regardless of the requested limit.
pub const MAX_CANDIDATES: usize = 200;

/// Per-stage population counts for one discovery request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryCounts {
    /// POIs inside the radius, before any truncation
    pub candidates: usize,
    /// Candidates that entered weather resolution
    pub after_weather: usize,
    /// Candidates surviving the preference filter
    pub after_filter: usize,
}

/// Result of one discovery request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub results: Vec<EnrichedPoi>,
    pub counts: DiscoveryCounts,
    pub cache: CacheStats,
}

/// Discovery engine over an injected store, resolver, and cache
pub struct DiscoveryService {
    store: Arc<dyn PoiStore>,
    resolver: BatchWeatherResolver,
    cache: Arc<WeatherCache>,
    unit: DistanceUnit,
}

impl DiscoveryService {
    #[must_use]
    pub fn new(
        store: Arc<dyn PoiStore>,
        resolver: BatchWeatherResolver,
        cache: Arc<WeatherCache>,
        unit: DistanceUnit,
    ) -> Self {
        Self {
            store,
            resolver,
            cache,
            unit,
        }
    }

    /// Run the full pipeline for one request. An empty result set is a
    /// normal outcome, not an error.
    #[instrument(skip(self, pref), fields(radius = radius_miles, limit))]
    pub async fn discover(
        &self,
        user_location: Coordinate,
        radius_miles: f64,
        limit: usize,
        pref: &FilterPreference,
    ) -> Result<DiscoveryResponse> {
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(
                EngineError::validation("Search radius must be a positive number").into(),
            );
        }
        if limit == 0 {
            return Err(EngineError::validation("Result limit must be at least 1").into());
        }

        let candidates = self
            .store
            .find_near(&user_location, radius_miles, MAX_CANDIDATES)
            .await?;
        let candidate_count = candidates.len();

        // Nearest first; equidistant POIs break the tie on ascending rank
        // so ordering stays deterministic.
        let mut ranked: Vec<(f64, Poi)> = candidates
            .into_iter()
            .map(|poi| {
                (
                    distance_between(&user_location, &poi.coordinate(), self.unit),
                    poi,
                )
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.rank.cmp(&b.1.rank))
        });
        ranked.truncate(limit);

        let coords: Vec<Coordinate> = ranked.iter().map(|(_, poi)| poi.coordinate()).collect();
        let records = self.resolver.resolve(&coords).await;

        let enriched: Vec<EnrichedPoi> = ranked
            .into_iter()
            .zip(records)
            .map(|((distance, poi), weather)| EnrichedPoi {
                poi,
                weather,
                distance_miles: distance,
            })
            .collect();
        let after_weather = enriched.len();

        let results = WeatherPreferenceFilter::apply(enriched, pref);

        let counts = DiscoveryCounts {
            candidates: candidate_count,
            after_weather,
            after_filter: results.len(),
        };
        let cache = self.cache.stats();
        info!(
            "discovery: {} candidates, {} enriched, {} after filter, cache hit rate {:.1}%",
            counts.candidates, counts.after_weather, counts.after_filter, cache.hit_rate_pct
        );

        Ok(DiscoveryResponse {
            results,
            counts,
            cache,
        })
    }
}
