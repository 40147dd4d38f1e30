//! HTTP route handlers for the tweetfeed service.
//!
//! This module contains the HTTP route handler functions that expose the
//! search entry points and render their results as JSON.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::SearchError;
use crate::model::AggregatedResult;
use crate::twitter::TwitterClient;

pub const DEFAULT_WAIT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_HITS: usize = 100;

/// Shared state of the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<TwitterClient>,
}

/// Builds the router with all application routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/stream", get(handle_stream))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
}

fn default_wait_seconds() -> u64 {
    DEFAULT_WAIT_SECONDS
}

fn default_max_hits() -> usize {
    DEFAULT_MAX_HITS
}

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "tweetfeed"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "tweetfeed"}))
}

/// Handles GET requests to `/search?query=...`.
///
/// # Success Response
///
/// ```json
/// {
///   "status": "success",
///   "hitCount": 1,
///   "tweetsByAuthor": { "<author json>": [ { "id": "...", ... } ] }
/// }
/// ```
///
/// An empty query is answered with `400 Bad Request`.
pub async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> HandlerResult {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => return render(Err(e)),
    };
    info!("Search requested for query: '{}'", params.query);
    render(state.client.search_recent(&params.query).await)
}

/// Handles GET requests to `/stream?wait_seconds=...&max_hits=...`.
///
/// Budgets default to 30 seconds and 100 hits. A budget below 1, or one
/// that is not a non-negative integer, is answered with `400 Bad Request`.
pub async fn handle_stream(
    State(state): State<AppState>,
    params: Result<Query<StreamParams>, QueryRejection>,
) -> HandlerResult {
    let params = match query_params(params) {
        Ok(params) => params,
        Err(e) => return render(Err(e)),
    };
    info!(
        "Stream requested with wait_seconds={} max_hits={}",
        params.wait_seconds, params.max_hits
    );
    render(
        state
            .client
            .search_stream(params.wait_seconds, params.max_hits)
            .await,
    )
}

/// Turns a query string the extractor could not deserialize into an
/// invalid-argument error, so it gets the same JSON error body.
fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, SearchError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| SearchError::InvalidArgument(rejection.body_text()))
}

fn render(result: Result<AggregatedResult, SearchError>) -> HandlerResult {
    match result {
        Ok(result) => Ok(Json(json!({
            "status": "success",
            "hitCount": result.hit_count(),
            "tweetsByAuthor": result,
        }))),
        Err(e) => {
            error!("Rejected search request: {}", e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "message": "Invalid search request",
                    "error": e.to_string(),
                })),
            ))
        }
    }
}
