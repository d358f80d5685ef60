//! HTTP route handlers for the browser server.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::error::ApiError;
use super::metrics::Metrics;
use super::request::{ConnectRequest, RecordsParams, SummaryRequest};
use super::response::{
    MessageResponse, NamespacesResponse, RecordsResponse, SetsResponse, SummaryResponse,
};
use crate::browser::{Browser, ConnectOutcome};
use crate::model::ClusterStats;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub browser: Arc<Browser>,
    pub metrics: Arc<Metrics>,
}

/// Handle POST /api/connect
pub async fn handle_connect(
    State(state): State<AppState>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = body?;
    let message = match state.browser.connect(request.into()).await? {
        ConnectOutcome::Connected => "Connected successfully",
        ConnectOutcome::AlreadyConnected => "Already connected",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Handle POST /api/disconnect
pub async fn handle_disconnect(State(state): State<AppState>) -> Json<MessageResponse> {
    state.browser.disconnect().await;
    Json(MessageResponse::new("Disconnected"))
}

/// Handle GET /api/stats
pub async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<ClusterStats>, ApiError> {
    Ok(Json(state.browser.stats().await?))
}

/// Handle GET /api/namespaces
pub async fn handle_namespaces(
    State(state): State<AppState>,
) -> Result<Json<NamespacesResponse>, ApiError> {
    let namespaces = state.browser.list_namespaces().await?;
    Ok(Json(namespaces.into()))
}

/// Handle GET /api/namespaces/{namespace}/sets
pub async fn handle_sets(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<SetsResponse>, ApiError> {
    let sets = state.browser.list_sets(&namespace).await?;
    state.metrics.browser_set_listings_total.inc();
    Ok(Json(SetsResponse::from(sets.as_slice())))
}

/// Handle GET /api/namespaces/{namespace}/sets/{set}/records
///
/// Without a cursor the scan starts at the beginning of the set. The
/// response's `nextCursor` is `null` once the set is exhausted.
pub async fn handle_records(
    State(state): State<AppState>,
    Path((namespace, set)): Path<(String, String)>,
    params: Result<Query<RecordsParams>, QueryRejection>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let Query(params) = params?;
    let page = state
        .browser
        .records(&namespace, &set, params.cursor(), params.limit)
        .await?;

    state.metrics.browser_scan_pages_total.inc();
    state
        .metrics
        .browser_records_scanned_total
        .inc_by(page.records.len() as u64);
    Ok(Json(page.into()))
}

/// Handle POST /api/schema-summary
pub async fn handle_schema_summary(
    State(state): State<AppState>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Json(request) = body?;
    let summary = state
        .browser
        .summarize_schema(&request.records, &request.set_name)
        .await?;
    state.metrics.browser_summaries_total.inc();
    Ok(Json(SummaryResponse { summary }))
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Handle GET /-/ready. Ready once a cluster session is live.
pub async fn handle_ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.browser.is_connected().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not connected")
    }
}
