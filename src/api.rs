//! HTTP API routes
//!
//! Thin translation layer: query parameters in, discovery pipeline, JSON
//! out. Validation failures map to 400 with the user-facing message; anything
//! else is a 500.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use crate::EngineError;
use crate::config::DiscoveryConfig;
use crate::discovery::{DiscoveryResponse, DiscoveryService};
use crate::filter::FilterPreference;
use crate::models::Coordinate;

/// Shared state handed to every route handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DiscoveryService>,
    pub defaults: DiscoveryConfig,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverParams {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
    pub limit: Option<usize>,
    pub temperature: Option<String>,
    pub precipitation: Option<String>,
    pub wind: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/discover", get(discover))
        .route("/health", get(health))
        .with_state(state)
}

async fn discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverParams>,
) -> Result<Json<DiscoveryResponse>, (StatusCode, Json<ApiError>)> {
    let center = Coordinate::new(params.lat, params.lng).map_err(|e| bad_request(&e))?;
    let pref = FilterPreference::parse(
        params.temperature.as_deref(),
        params.precipitation.as_deref(),
        params.wind.as_deref(),
    )
    .map_err(|e| bad_request(&e))?;

    let radius = params
        .radius
        .unwrap_or(state.defaults.default_radius_miles);
    let limit = params
        .limit
        .unwrap_or(state.defaults.default_max_results as usize);

    let response = state
        .service
        .discover(center, radius, limit, &pref)
        .await
        .map_err(|e| match e.downcast_ref::<EngineError>() {
            Some(engine_error @ EngineError::Validation { .. }) => bad_request(engine_error),
            _ => {
                error!("discovery request failed: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError {
                        error: "Internal server error".to_string(),
                    }),
                )
            }
        })?;

    Ok(Json(response))
}

fn bad_request(e: &EngineError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: e.user_message(),
        }),
    )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
