use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use pulse_backend::config::Settings;
use pulse_backend::handlers::stream_ws::SnapshotBroadcaster;
use pulse_backend::models::snapshot::{AxiomMetrics, Snapshot};
use pulse_backend::models::social::XData;
use pulse_backend::services::{
    axiom::AxiomService,
    history::HistoryStore,
    sol_price::SolPriceService,
    x_api::{XApiService, XCredentials},
};
use pulse_backend::{AppState, TrackerState, build_router};

// Each test gets its own tempdir-backed history store; no network is touched
// by any of the read endpoints.
fn build_test_app(data_dir: &std::path::Path) -> (Router, AppState) {
    let state = AppState {
        settings: Arc::new(Settings::default()),
        history: HistoryStore::open(data_dir, 100).expect("history store"),
        axiom: AxiomService::new(None),
        x_api: XApiService::new(XCredentials::default()),
        sol_price: SolPriceService::new(600),
        tracker: TrackerState::new(),
        broadcaster: SnapshotBroadcaster::new(),
        started_at: Utc::now(),
    };
    (build_router(state.clone()), state)
}

fn sample_snapshot(minute: u32, market_cap_usd: f64) -> Snapshot {
    Snapshot {
        timestamp: Utc.with_ymd_and_hms(2025, 6, 30, 12, minute, 0).unwrap(),
        axiom: AxiomMetrics {
            token_name: Some("Sample Token".to_string()),
            token_ticker: Some("SMPL".to_string()),
            market_cap_usd: Some(market_cap_usd),
            market_cap_sol: Some(market_cap_usd / 150.0),
            volume_usd: 250.0,
            buy_volume_usd: 600.0,
            sell_volume_usd: 350.0,
            buy_count: 12,
            sell_count: 7,
            num_holders: Some(40 + minute as i64),
            sol_price_usd: 150.0,
            ..Default::default()
        },
        x_data: XData::empty(),
        unique_authors: 3,
        author_followers: vec![],
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn latest_data_reports_no_data_marker_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(dir.path());

    let (status, json) = get_json(app, "/api/data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], "no data available");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn latest_data_returns_most_recent_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();
    state.history.append(&sample_snapshot(1, 12_000.0)).unwrap();

    let (status, json) = get_json(app, "/api/data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["axiom"]["marketCapUSD"], 12_000.0);
    assert_eq!(json["axiom"]["tokenTicker"], "SMPL");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn history_respects_limit_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    for minute in 0..5 {
        state
            .history
            .append(&sample_snapshot(minute, 10_000.0 + minute as f64))
            .unwrap();
    }

    let (status, json) = get_json(app, "/api/history?limit=3").await;

    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    // oldest first within the window
    assert_eq!(entries[0]["axiom"]["marketCapUSD"], 10_002.0);
    assert_eq!(entries[2]["axiom"]["marketCapUSD"], 10_004.0);
}

#[tokio::test]
async fn marketcap_chart_has_current_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();
    state.history.append(&sample_snapshot(1, 11_500.0)).unwrap();

    let (status, json) = get_json(app, "/api/marketcap").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"]["marketCapUSD"], 11_500.0);
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["time"], "12:00");
}

#[tokio::test]
async fn buys_sells_chart_reports_signed_net_volume() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();

    let (status, json) = get_json(app, "/api/buys-sells").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"]["buyVolume"], 600.0);
    assert_eq!(json["current"]["sellVolume"], 350.0);
    assert_eq!(json["current"]["buyCount"], 12);
}

#[tokio::test]
async fn holders_chart_computes_percent_change() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    // 40 holders at minute 0, 41 at minute 1
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();
    state.history.append(&sample_snapshot(1, 10_000.0)).unwrap();

    let (status, json) = get_json(app, "/api/holders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"]["holderCount"], 41);
    assert_eq!(json["current"]["holderIncrease"], 1);
    assert_eq!(json["current"]["percentChange"], 2.5);
}

#[tokio::test]
async fn metrics_summary_rolls_up_latest_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(2, 9_000.0)).unwrap();

    let (status, json) = get_json(app, "/api/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["marketCapUSD"], 9_000.0);
    assert_eq!(json["holders"], 42);
    assert_eq!(json["uniqueAuthors"], 3);
}

#[tokio::test]
async fn status_reflects_configuration_and_data_points() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();

    let (status, json) = get_json(app, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "active");
    assert_eq!(json["dataPoints"], 1);
    assert_eq!(json["pairAddress"], Value::Null);
}

#[tokio::test]
async fn config_rejects_missing_pair_address() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(dir.path());

    let (status, json) = post_json(app, "/api/config", json!({ "communityId": "123" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required field: pairAddress");
}

#[tokio::test]
async fn config_accepts_explicit_pair_and_community() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());

    let (status, json) = post_json(
        app.clone(),
        "/api/config",
        json!({ "pairAddress": "So1PairAddress111", "communityId": "1234567890" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["config"]["pairAddress"], "So1PairAddress111");
    assert_eq!(json["config"]["autoDiscovered"], false);

    let target = state.tracker.get().expect("tracker set");
    assert_eq!(target.community_id, "1234567890");

    let (status, json) = get_json(app, "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pairAddress"], "So1PairAddress111");
    assert_eq!(json["communityId"], "1234567890");
}

#[tokio::test]
async fn download_serves_the_raw_log() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = build_test_app(dir.path());
    state.history.append(&sample_snapshot(0, 10_000.0)).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let first_line = std::str::from_utf8(&body).unwrap().lines().next().unwrap();
    let parsed: Value = serde_json::from_str(first_line).unwrap();
    assert_eq!(parsed["axiom"]["marketCapUSD"], 10_000.0);
}

#[tokio::test]
async fn wallet_age_is_zeroed_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(dir.path());

    let (status, json) = get_json(app, "/api/wallet-age").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalHolders"], 0);
    assert_eq!(json["distribution"]["baby"], 0);
}
