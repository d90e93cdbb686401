use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use config::Settings;
use handlers::stream_ws::SnapshotBroadcaster;
use services::{
    axiom::AxiomService, history::HistoryStore, sol_price::SolPriceService, x_api::XApiService,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub history: HistoryStore,
    pub axiom: AxiomService,
    pub x_api: XApiService,
    pub sol_price: SolPriceService,
    pub tracker: TrackerState,
    pub broadcaster: SnapshotBroadcaster,
    pub started_at: DateTime<Utc>,
}

/// The pair/community the daemon is currently tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerTarget {
    pub pair_address: String,
    pub community_id: String,
}

/// Runtime tracker target. Unset until the first successful POST /api/config;
/// the config handler is the only writer.
#[derive(Clone, Default)]
pub struct TrackerState {
    inner: Arc<RwLock<Option<TrackerTarget>>>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, target: TrackerTarget) {
        *self.inner.write() = Some(target);
    }

    pub fn get(&self) -> Option<TrackerTarget> {
        self.inner.read().clone()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// The full API surface. Shared between the binary and the integration tests.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::get;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    axum::Router::new()
        .route("/api/data", get(handlers::data::latest_data))
        .route("/api/history", get(handlers::data::history_data))
        .route("/api/marketcap", get(handlers::charts::market_cap))
        .route("/api/tokeninfo", get(handlers::data::token_info))
        .route("/api/buys-sells", get(handlers::charts::buys_sells))
        .route("/api/wallet-age", get(handlers::charts::wallet_age))
        .route("/api/social", get(handlers::charts::social))
        .route("/api/metrics", get(handlers::data::metrics_summary))
        .route("/api/holders", get(handlers::charts::holders))
        .route(
            "/api/config",
            get(handlers::config::current_config).post(handlers::config::update_config),
        )
        .route("/api/status", get(handlers::data::status))
        .route("/api/stream", get(handlers::stream_ws::snapshot_stream))
        .route("/api/download", get(handlers::data::download_log))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod config;

pub mod models {
    pub mod charts;
    pub mod config;
    pub mod snapshot;
    pub mod social;
}

pub mod services {
    pub mod axiom;
    pub mod history;
    pub mod metrics;
    pub mod sol_price;
    pub mod x_api;
}

pub mod handlers {
    pub mod charts;
    pub mod config;
    pub mod data;
    pub mod stream_ws;
}

pub mod jobs;
