use std::env;
use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_backend::config::Settings;
use pulse_backend::handlers::stream_ws::SnapshotBroadcaster;
use pulse_backend::jobs::{retention::start_retention_job, snapshot_sync::start_snapshot_sync_job};
use pulse_backend::services::{
    axiom::AxiomService,
    history::HistoryStore,
    sol_price::SolPriceService,
    x_api::{XApiService, XCredentials},
};
use pulse_backend::{AppState, TrackerState, build_router};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pulse_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Arc::new(Settings::from_env());
    tracing::info!(
        "Starting pulse backend (data dir: {}, fetch every {}s)",
        settings.data_dir.display(),
        settings.fetch_interval_secs
    );

    let history = HistoryStore::open(&settings.data_dir, settings.history_max_entries)
        .expect("Failed to open history store");
    tracing::info!("History store loaded ({} snapshots)", history.len());

    let sol_price = SolPriceService::new(settings.price_interval_secs);
    sol_price.start_polling();

    let state = AppState {
        settings: settings.clone(),
        history,
        axiom: AxiomService::new(env::var("AXIOM_COOKIE").ok()),
        x_api: XApiService::new(XCredentials::from_env()),
        sol_price,
        tracker: TrackerState::new(),
        broadcaster: SnapshotBroadcaster::new(),
        started_at: Utc::now(),
    };

    // Background loops
    start_snapshot_sync_job(state.clone());
    start_retention_job(state.clone());

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("bound listener has an address")
    );

    axum::serve(listener, app).await.expect("Server error");
}
