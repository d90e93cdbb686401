//! Derived chart views over the history: market cap, buy/sell volume,
//! wallet-age distribution, social engagement and holder counts.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};

use crate::AppState;
use crate::models::charts::{
    HolderPoint, HoldersCurrent, HoldersResponse, MarketCapCurrent, MarketCapPoint,
    MarketCapResponse, SocialCurrent, SocialPoint, SocialResponse, VolumeCurrent, VolumePoint,
    VolumeResponse, WalletAgeResponse,
};
use crate::services::metrics::engagement_totals;

const MARKET_CAP_WINDOW: usize = 100;
const VOLUME_WINDOW: usize = 50;
const SOCIAL_WINDOW: usize = 50;
const HOLDERS_WINDOW: usize = 100;
const HOLDER_SAMPLE: usize = 50;

fn stamp(timestamp: &DateTime<Utc>) -> (String, String) {
    (
        timestamp.to_rfc3339(),
        timestamp.format("%H:%M").to_string(),
    )
}

/// Handler for GET /api/marketcap
pub async fn market_cap(State(state): State<AppState>) -> Json<MarketCapResponse> {
    let history = state
        .history
        .tail(MARKET_CAP_WINDOW)
        .into_iter()
        .map(|snapshot| {
            let (timestamp, time) = stamp(&snapshot.timestamp);
            MarketCapPoint {
                timestamp,
                time,
                market_cap_usd: snapshot.axiom.market_cap_usd.unwrap_or(0.0),
                market_cap_sol: snapshot.axiom.market_cap_sol.unwrap_or(0.0),
                volume_usd: snapshot.axiom.volume_usd,
            }
        })
        .collect();

    let current = state
        .history
        .latest()
        .map(|snapshot| MarketCapCurrent {
            market_cap_usd: snapshot.axiom.market_cap_usd.unwrap_or(0.0),
            market_cap_sol: snapshot.axiom.market_cap_sol.unwrap_or(0.0),
            volume_usd: snapshot.axiom.volume_usd,
            last_updated: snapshot.timestamp.to_rfc3339(),
        })
        .unwrap_or_default();

    Json(MarketCapResponse { current, history })
}

/// Handler for GET /api/buys-sells
pub async fn buys_sells(State(state): State<AppState>) -> Json<VolumeResponse> {
    let history = state
        .history
        .tail(VOLUME_WINDOW)
        .into_iter()
        .map(|snapshot| {
            let (timestamp, time) = stamp(&snapshot.timestamp);
            VolumePoint {
                timestamp,
                time,
                buy_volume: snapshot.axiom.buy_volume_usd,
                sell_volume: snapshot.axiom.sell_volume_usd,
                net_volume: snapshot.axiom.volume_usd,
                buy_count: snapshot.axiom.buy_count,
                sell_count: snapshot.axiom.sell_count,
            }
        })
        .collect();

    let current = state
        .history
        .latest()
        .map(|snapshot| VolumeCurrent {
            buy_volume: snapshot.axiom.buy_volume_usd,
            sell_volume: snapshot.axiom.sell_volume_usd,
            net_volume: snapshot.axiom.volume_usd,
            buy_count: snapshot.axiom.buy_count,
            sell_count: snapshot.axiom.sell_count,
            last_updated: snapshot.timestamp.to_rfc3339(),
        })
        .unwrap_or_default();

    Json(VolumeResponse { current, history })
}

/// Handler for GET /api/wallet-age - distribution from the latest snapshot
/// plus a bounded holder sample.
pub async fn wallet_age(State(state): State<AppState>) -> Json<WalletAgeResponse> {
    let Some(snapshot) = state.history.latest() else {
        return Json(WalletAgeResponse::default());
    };
    let mut holders = snapshot.axiom.holders;
    holders.truncate(HOLDER_SAMPLE);
    Json(WalletAgeResponse {
        distribution: snapshot.axiom.wallet_age_counts,
        total_holders: snapshot.axiom.total_holders,
        holders,
        last_updated: snapshot.timestamp.to_rfc3339(),
    })
}

/// Handler for GET /api/social - engagement sums recomputed per stored timeline.
pub async fn social(State(state): State<AppState>) -> Json<SocialResponse> {
    let history = state
        .history
        .tail(SOCIAL_WINDOW)
        .into_iter()
        .map(|snapshot| {
            let totals = engagement_totals(snapshot.x_data.posts());
            let (timestamp, time) = stamp(&snapshot.timestamp);
            SocialPoint {
                timestamp,
                time,
                views: totals.views,
                likes: totals.likes,
                retweets: totals.retweets,
                replies: totals.replies,
                unique_authors: snapshot.unique_authors,
            }
        })
        .collect();

    let current = state
        .history
        .latest()
        .map(|snapshot| {
            let totals = engagement_totals(snapshot.x_data.posts());
            SocialCurrent {
                views: totals.views,
                likes: totals.likes,
                retweets: totals.retweets,
                replies: totals.replies,
                unique_authors: snapshot.unique_authors,
                member_count: snapshot.x_data.member_count(),
                last_updated: snapshot.timestamp.to_rfc3339(),
            }
        })
        .unwrap_or_default();

    Json(SocialResponse { current, history })
}

/// Handler for GET /api/holders - holder-count series with cycle-over-cycle change.
pub async fn holders(State(state): State<AppState>) -> Json<HoldersResponse> {
    let history: Vec<HolderPoint> = state
        .history
        .tail(HOLDERS_WINDOW)
        .into_iter()
        .map(|snapshot| {
            let (timestamp, time) = stamp(&snapshot.timestamp);
            HolderPoint {
                timestamp,
                time,
                value: snapshot.axiom.num_holders.unwrap_or(0),
                market_cap: snapshot.axiom.market_cap_usd.unwrap_or(0.0),
                unique_authors: snapshot.unique_authors,
            }
        })
        .collect();

    let Some(snapshot) = state.history.latest() else {
        return Json(HoldersResponse::default());
    };

    let holder_count = snapshot.axiom.num_holders.unwrap_or(0);
    let (percent_change, holder_increase) = if history.len() >= 2 {
        let previous = history[history.len() - 2].value;
        if previous > 0 {
            let change = (holder_count - previous) as f64 / previous as f64 * 100.0;
            ((change * 100.0).round() / 100.0, holder_count - previous)
        } else {
            (0.0, 0)
        }
    } else {
        (0.0, 0)
    };

    Json(HoldersResponse {
        current: HoldersCurrent {
            holder_count,
            percent_change,
            holder_increase,
            last_updated: snapshot.timestamp.to_rfc3339(),
            wallet_age_distribution: snapshot.axiom.wallet_age_counts,
            total_holders: snapshot.axiom.total_holders,
        },
        history,
    })
}
