//! Metric derivation: one flattened snapshot per fetch cycle.
//!
//! Combines the raw trading documents, the social fetch, the holder list and the
//! cached reference price into a `Snapshot`. Missing nested fields default to
//! zero or null per-field; absence of upstream data degrades specific fields,
//! never the whole snapshot. This module never errors.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;

use crate::models::snapshot::{
    AxiomMetrics, CachedPrice, HolderInfo, Snapshot, WalletAgeCounts,
};
use crate::models::social::{AuthorFollowers, SocialPost, XData};

/// Derive the snapshot for one cycle.
///
/// `prior_max_mc_usd` is the running maximum USD market cap over all history so
/// far; the fib retracement maximum includes the current snapshot's cap.
pub fn derive_snapshot(
    trading: &HashMap<String, Value>,
    social: XData,
    holders: Vec<HolderInfo>,
    price: CachedPrice,
    prior_max_mc_usd: f64,
    min_mc_usd: f64,
) -> Snapshot {
    let empty = Value::Null;
    let pair_info = trading.get("pair_info").unwrap_or(&empty);
    let token_info = trading.get("token_info").unwrap_or(&empty);
    let token_holders = trading.get("token_holders").unwrap_or(&empty);
    let first_stats = trading
        .get("pair_stats")
        .and_then(Value::as_array)
        .and_then(|stats| stats.first());

    let sol_price_usd = price.price;

    // Market cap is None (not zero) when no stats came back this cycle.
    let supply = opt_f64(pair_info, "supply");
    let market_cap_sol =
        first_stats.map(|stats| f64_of(stats, "priceSol") * supply.unwrap_or(0.0));
    let market_cap_usd = market_cap_sol.map(|sol| sol * sol_price_usd);

    let (fib_level62, fib_level50) =
        fib_levels(min_mc_usd, prior_max_mc_usd.max(market_cap_usd.unwrap_or(0.0)));

    let buy_volume_sol = first_stats.map(|s| f64_of(s, "buyVolumeSol")).unwrap_or(0.0);
    let sell_volume_sol = first_stats.map(|s| f64_of(s, "sellVolumeSol")).unwrap_or(0.0);
    let buy_count = first_stats.map(|s| i64_of(s, "buyCount")).unwrap_or(0);
    let sell_count = first_stats.map(|s| i64_of(s, "sellCount")).unwrap_or(0);
    let volume_sol = buy_volume_sol - sell_volume_sol;

    let liquidity_sol = opt_f64(pair_info, "initialLiquiditySol");
    let num_holders = token_info.get("numHolders").and_then(Value::as_i64);
    let total_holders = num_holders.unwrap_or(holders.len() as i64);

    let wallet_age_counts = wallet_age_counts(&holders, total_holders);

    let (unique_authors, author_followers) = dedup_authors(social.posts());

    let axiom = AxiomMetrics {
        token_address: str_of(pair_info, "tokenAddress"),
        token_name: str_of(pair_info, "tokenName"),
        token_ticker: str_of(pair_info, "tokenTicker"),
        dex_paid: pair_info.get("dexPaid").and_then(Value::as_bool),
        twitter: str_of(pair_info, "twitter"),
        token_image: str_of(pair_info, "tokenImage"),
        created_at: str_of(pair_info, "createdAt"),
        market_cap_sol,
        market_cap_usd,
        fib_level62,
        fib_level50,
        volume_sol,
        volume_usd: volume_sol * sol_price_usd,
        net_count: buy_count - sell_count,
        buy_volume_sol,
        buy_volume_usd: buy_volume_sol * sol_price_usd,
        sell_volume_sol,
        sell_volume_usd: sell_volume_sol * sol_price_usd,
        buy_count,
        sell_count,
        liquidity_sol,
        liquidity_usd: liquidity_sol.unwrap_or(0.0) * sol_price_usd,
        num_holders,
        supply,
        sol_price_usd,
        price_last_updated: price.last_updated,
        holders,
        wallet_age_counts,
        total_holders,
        top10_holders_percent: f64_of(token_holders, "top10HoldersPercent"),
        insiders_hold_percent: f64_of(token_holders, "insidersHoldPercent"),
        bundlers_hold_percent: f64_of(token_holders, "bundlersHoldPercent"),
        snipers_hold_percent: f64_of(token_holders, "snipersHoldPercent"),
    };

    Snapshot {
        timestamp: Utc::now(),
        axiom,
        x_data: social,
        unique_authors,
        author_followers,
    }
}

/// Fibonacci retracement levels between a fixed floor and the observed maximum.
/// Holds `min <= fib50 <= fib62 <= max` whenever `max >= min`.
pub fn fib_levels(min_mc: f64, max_mc: f64) -> (f64, f64) {
    let max_mc = max_mc.max(min_mc);
    let range = max_mc - min_mc;
    (min_mc + 0.62 * range, min_mc + 0.50 * range)
}

/// Bucket the current fetch's holders by funding age. When the holder fetch
/// came back empty but a positive total-holder count was reported, fall back to
/// a proportional 40/30/30 estimate — a documented best-effort heuristic, not
/// an exact distribution.
pub fn wallet_age_counts(holders: &[HolderInfo], total_holders: i64) -> WalletAgeCounts {
    if holders.is_empty() && total_holders > 0 {
        return estimate_wallet_age_counts(total_holders);
    }

    let mut counts = WalletAgeCounts::default();
    for holder in holders {
        counts.record(holder.age_category);
    }
    counts
}

fn estimate_wallet_age_counts(total_holders: i64) -> WalletAgeCounts {
    WalletAgeCounts {
        baby: ((total_holders as f64 * 0.4) as i64).max(1),
        adult: ((total_holders as f64 * 0.3) as i64).max(1),
        old: ((total_holders as f64 * 0.3) as i64).max(1),
        unknown: 0,
    }
}

/// Engagement counter sums over one timeline fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementTotals {
    pub views: i64,
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
}

pub fn engagement_totals(posts: &[SocialPost]) -> EngagementTotals {
    let mut totals = EngagementTotals::default();
    for post in posts {
        totals.views += post.views.parse::<i64>().unwrap_or(0);
        totals.likes += post.favorite_count;
        totals.retweets += post.retweet_count;
        totals.replies += post.reply_count;
    }
    totals
}

/// Distinct author handles in first-seen order, with a parallel
/// author-to-followers list.
fn dedup_authors(posts: &[SocialPost]) -> (usize, Vec<AuthorFollowers>) {
    let mut seen = HashSet::new();
    let mut author_followers = Vec::new();
    for post in posts {
        let Some(author) = post.author_screen.as_deref() else {
            continue;
        };
        if author.is_empty() || !seen.insert(author.to_string()) {
            continue;
        }
        author_followers.push(AuthorFollowers {
            author: author.to_string(),
            followers: post.followers_count,
            author_name: post.author_name.clone().unwrap_or_default(),
        });
    }
    (seen.len(), author_followers)
}

fn f64_of(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn opt_f64(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn i64_of(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn str_of(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
