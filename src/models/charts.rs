use serde::{Deserialize, Serialize};

use crate::models::snapshot::{HolderInfo, WalletAgeCounts};

/// Query parameters for GET /api/history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Cap the number of returned snapshots, newest last. Default: everything
    /// the in-memory ring holds.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketCapPoint {
    pub timestamp: String,
    pub time: String,
    #[serde(rename = "marketCapUSD")]
    pub market_cap_usd: f64,
    #[serde(rename = "marketCapSol")]
    pub market_cap_sol: f64,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketCapCurrent {
    #[serde(rename = "marketCapUSD")]
    pub market_cap_usd: f64,
    #[serde(rename = "marketCapSol")]
    pub market_cap_sol: f64,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketCapResponse {
    pub current: MarketCapCurrent,
    pub history: Vec<MarketCapPoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumePoint {
    pub timestamp: String,
    pub time: String,
    #[serde(rename = "buyVolume")]
    pub buy_volume: f64,
    #[serde(rename = "sellVolume")]
    pub sell_volume: f64,
    #[serde(rename = "netVolume")]
    pub net_volume: f64,
    #[serde(rename = "buyCount")]
    pub buy_count: i64,
    #[serde(rename = "sellCount")]
    pub sell_count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeCurrent {
    #[serde(rename = "buyVolume")]
    pub buy_volume: f64,
    #[serde(rename = "sellVolume")]
    pub sell_volume: f64,
    #[serde(rename = "netVolume")]
    pub net_volume: f64,
    #[serde(rename = "buyCount")]
    pub buy_count: i64,
    #[serde(rename = "sellCount")]
    pub sell_count: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeResponse {
    pub current: VolumeCurrent,
    pub history: Vec<VolumePoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialPoint {
    pub timestamp: String,
    pub time: String,
    pub views: i64,
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    #[serde(rename = "uniqueAuthors")]
    pub unique_authors: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialCurrent {
    pub views: i64,
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    #[serde(rename = "uniqueAuthors")]
    pub unique_authors: usize,
    #[serde(rename = "memberCount")]
    pub member_count: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialResponse {
    pub current: SocialCurrent,
    pub history: Vec<SocialPoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HolderPoint {
    pub timestamp: String,
    pub time: String,
    pub value: i64,
    #[serde(rename = "marketCap")]
    pub market_cap: f64,
    #[serde(rename = "uniqueAuthors")]
    pub unique_authors: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HoldersCurrent {
    #[serde(rename = "holderCount")]
    pub holder_count: i64,
    #[serde(rename = "percentChange")]
    pub percent_change: f64,
    #[serde(rename = "holderIncrease")]
    pub holder_increase: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(rename = "walletAgeDistribution")]
    pub wallet_age_distribution: WalletAgeCounts,
    #[serde(rename = "totalHolders")]
    pub total_holders: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HoldersResponse {
    pub current: HoldersCurrent,
    pub history: Vec<HolderPoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WalletAgeResponse {
    pub distribution: WalletAgeCounts,
    #[serde(rename = "totalHolders")]
    pub total_holders: i64,
    pub holders: Vec<HolderInfo>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenInfoResponse {
    #[serde(rename = "tokenAddress")]
    pub token_address: Option<String>,
    #[serde(rename = "tokenName")]
    pub token_name: Option<String>,
    #[serde(rename = "tokenTicker")]
    pub token_ticker: Option<String>,
    pub twitter: Option<String>,
    #[serde(rename = "tokenImage")]
    pub token_image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Rolled-up summary for the dashboard header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSummary {
    #[serde(rename = "marketCapUSD")]
    pub market_cap_usd: f64,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    pub holders: i64,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: f64,
    #[serde(rename = "uniqueAuthors")]
    pub unique_authors: usize,
    #[serde(rename = "memberCount")]
    pub member_count: i64,
    #[serde(rename = "solPrice")]
    pub sol_price: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub started_at: String,
    pub uptime_seconds: i64,
    pub data_points: usize,
    pub pair_address: Option<String>,
    pub community_id: Option<String>,
}
