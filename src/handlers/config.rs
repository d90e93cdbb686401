//! Tracker configuration endpoint.
//!
//! POST /api/config sets the pair being tracked. When the caller omits the
//! community id we try to discover it from the pair's social URL before
//! rejecting the request.

use axum::{Json, extract::State, http::StatusCode};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::models::config::{
    ConfigRequest, ConfigResponse, ConfigView, CurrentConfigResponse, ErrorResponse,
};
use crate::{AppState, TrackerTarget};

lazy_static! {
    static ref COMMUNITY_ID_RE: Regex =
        Regex::new(r"communities/(\d+)(?:[/?#]|$)").expect("valid community id pattern");
}

/// Pull a numeric community id out of an x.com community URL.
pub fn extract_community_id(twitter_url: &str) -> Option<String> {
    COMMUNITY_ID_RE
        .captures(twitter_url)
        .map(|caps| caps[1].to_string())
}

/// Handler for GET /api/config - the currently tracked pair, if any.
pub async fn current_config(State(state): State<AppState>) -> Json<CurrentConfigResponse> {
    let target = state.tracker.get();
    Json(CurrentConfigResponse {
        pair_address: target.as_ref().map(|t| t.pair_address.clone()),
        community_id: target.map(|t| t.community_id),
    })
}

/// Handler for POST /api/config
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<ConfigResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(pair_address) = request
        .pair_address
        .filter(|address| !address.trim().is_empty())
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing required field: pairAddress")),
        ));
    };

    let (community_id, twitter_url, auto_discovered) = match request
        .community_id
        .filter(|id| !id.trim().is_empty())
    {
        Some(id) => (id, None, false),
        None => {
            info!(
                "no communityId supplied, attempting discovery for pair {}",
                pair_address
            );
            let trading = state.axiom.fetch_trading_data(&pair_address).await;
            let twitter_url = trading
                .get("pair_info")
                .and_then(|info| info.get("twitter"))
                .and_then(|v| v.as_str())
                .map(str::to_string);

            match twitter_url.as_deref().and_then(extract_community_id) {
                Some(id) => {
                    info!("discovered community {} from {:?}", id, twitter_url);
                    (id, twitter_url, true)
                }
                None => {
                    warn!(
                        "could not discover a community id for pair {} (twitter: {:?})",
                        pair_address, twitter_url
                    );
                    return Err((
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: "Could not auto-discover communityId from the pair's twitter URL"
                                .to_string(),
                            twitter_url,
                            suggestion: Some("Please provide communityId manually".to_string()),
                        }),
                    ));
                }
            }
        }
    };

    state.tracker.set(TrackerTarget {
        pair_address: pair_address.clone(),
        community_id: community_id.clone(),
    });
    info!(
        "tracking configured: pair {} / community {}",
        pair_address, community_id
    );

    // warm the price cache so the first fetch cycle has a real conversion rate
    let sol_price = state.sol_price.clone();
    tokio::spawn(async move {
        if let Err(e) = sol_price.refresh_once().await {
            warn!("initial price refresh failed: {}", e);
        }
    });

    Ok(Json(ConfigResponse {
        status: "ok".to_string(),
        message: "Configuration updated".to_string(),
        config: ConfigView {
            pair_address,
            community_id,
            twitter_url,
            auto_discovered,
        },
    }))
}
