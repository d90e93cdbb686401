//! Core read endpoints over the accumulated history.
//!
//! These never fail because an upstream is down: they serve the last
//! successfully persisted snapshot, or an explicit no-data marker.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::AppState;
use crate::models::charts::{HistoryQuery, MetricsSummary, StatusResponse, TokenInfoResponse};
use crate::models::config::ErrorResponse;
use crate::models::snapshot::Snapshot;

/// Handler for GET /api/data - the latest snapshot, or a no-data marker.
pub async fn latest_data(State(state): State<AppState>) -> Json<Value> {
    match state.history.latest() {
        Some(snapshot) => Json(json!(snapshot)),
        None => Json(json!({
            "error": "no data available",
            "timestamp": Utc::now(),
        })),
    }
}

/// Handler for GET /api/history - bounded history, oldest first.
pub async fn history_data(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<Snapshot>> {
    match query.limit {
        Some(limit) => Json(state.history.tail(limit)),
        None => Json(state.history.all()),
    }
}

/// Handler for GET /api/tokeninfo - token identity fields from the latest snapshot.
pub async fn token_info(State(state): State<AppState>) -> Json<TokenInfoResponse> {
    let Some(snapshot) = state.history.latest() else {
        return Json(TokenInfoResponse::default());
    };
    let axiom = snapshot.axiom;
    Json(TokenInfoResponse {
        token_address: axiom.token_address,
        token_name: axiom.token_name,
        token_ticker: axiom.token_ticker,
        twitter: axiom.twitter,
        token_image: axiom.token_image,
        created_at: axiom.created_at,
    })
}

/// Handler for GET /api/metrics - rolled-up summary of the latest snapshot.
pub async fn metrics_summary(State(state): State<AppState>) -> Json<MetricsSummary> {
    let Some(snapshot) = state.history.latest() else {
        return Json(MetricsSummary::default());
    };
    Json(MetricsSummary {
        market_cap_usd: snapshot.axiom.market_cap_usd.unwrap_or(0.0),
        volume_usd: snapshot.axiom.volume_usd,
        holders: snapshot.axiom.num_holders.unwrap_or(0),
        liquidity_usd: snapshot.axiom.liquidity_usd,
        unique_authors: snapshot.unique_authors,
        member_count: snapshot.x_data.member_count(),
        sol_price: snapshot.axiom.sol_price_usd,
        last_updated: snapshot.timestamp.to_rfc3339(),
    })
}

/// Handler for GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let target = state.tracker.get();
    Json(StatusResponse {
        status: "active".to_string(),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        data_points: state.history.len(),
        pair_address: target.as_ref().map(|t| t.pair_address.clone()),
        community_id: target.map(|t| t.community_id),
    })
}

/// Handler for GET /api/download - the raw NDJSON log as a file attachment.
pub async fn download_log(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let path = state.history.log_path();
    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no snapshot log on disk yet")),
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-ndjson"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"snapshots.ndjson\"",
            ),
        ],
        bytes,
    ))
}
