use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::social::{AuthorFollowers, XData};

/// One persisted, timestamped flattened metrics record, produced per fetch cycle.
///
/// Immutable once appended to the history store. Field names inside `axiom` keep the
/// camelCase wire format the dashboard frontend already consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub axiom: AxiomMetrics,
    pub x_data: XData,
    pub unique_authors: usize,
    pub author_followers: Vec<AuthorFollowers>,
}

/// Flattened trading + holder + fib metrics for one cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxiomMetrics {
    pub token_address: Option<String>,
    pub token_name: Option<String>,
    pub token_ticker: Option<String>,
    pub dex_paid: Option<bool>,
    pub twitter: Option<String>,
    pub token_image: Option<String>,
    pub created_at: Option<String>,
    /// None means "no pair stats this cycle", which is distinct from a zero cap.
    pub market_cap_sol: Option<f64>,
    #[serde(rename = "marketCapUSD")]
    pub market_cap_usd: Option<f64>,
    pub fib_level62: f64,
    pub fib_level50: f64,
    /// buyVolume - sellVolume; signed, can be negative.
    pub volume_sol: f64,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    pub net_count: i64,
    pub buy_volume_sol: f64,
    #[serde(rename = "buyVolumeUSD")]
    pub buy_volume_usd: f64,
    pub sell_volume_sol: f64,
    #[serde(rename = "sellVolumeUSD")]
    pub sell_volume_usd: f64,
    pub buy_count: i64,
    pub sell_count: i64,
    pub liquidity_sol: Option<f64>,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: f64,
    pub num_holders: Option<i64>,
    pub supply: Option<f64>,
    #[serde(rename = "solPriceUSD")]
    pub sol_price_usd: f64,
    pub price_last_updated: i64,
    pub holders: Vec<HolderInfo>,
    pub wallet_age_counts: WalletAgeCounts,
    pub total_holders: i64,
    pub top10_holders_percent: f64,
    pub insiders_hold_percent: f64,
    pub bundlers_hold_percent: f64,
    pub snipers_hold_percent: f64,
}

/// One deduplicated holder wallet from the current fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderInfo {
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    #[serde(rename = "fundedAt")]
    pub funded_at: Option<String>,
    #[serde(rename = "ageCategory")]
    pub age_category: WalletAge,
}

/// Classification of a holder wallet by elapsed time since its funding timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletAge {
    Baby,
    Adult,
    Old,
    Unknown,
}

impl WalletAge {
    /// Categorize a wallet by funding-timestamp age: baby <= 30 days,
    /// adult <= 180 days, old beyond that. Missing or unparsable timestamps
    /// are Unknown and stay out of the three age buckets.
    pub fn classify(funded_at: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(raw) = funded_at else {
            return WalletAge::Unknown;
        };
        let Ok(funded) = DateTime::parse_from_rfc3339(raw) else {
            return WalletAge::Unknown;
        };
        let age_days = (now - funded.with_timezone(&Utc)).num_days();
        if age_days <= 30 {
            WalletAge::Baby
        } else if age_days <= 180 {
            WalletAge::Adult
        } else {
            WalletAge::Old
        }
    }
}

/// Fixed histogram of the current fetch's holder wallets by funding age.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAgeCounts {
    pub baby: i64,
    pub adult: i64,
    pub old: i64,
    pub unknown: i64,
}

impl WalletAgeCounts {
    pub fn record(&mut self, age: WalletAge) {
        match age {
            WalletAge::Baby => self.baby += 1,
            WalletAge::Adult => self.adult += 1,
            WalletAge::Old => self.old += 1,
            WalletAge::Unknown => self.unknown += 1,
        }
    }

    /// Sum of the three age buckets, excluding unknown.
    pub fn categorized(&self) -> i64 {
        self.baby + self.adult + self.old
    }
}

/// Process-wide cached reference price, refreshed on its own slower cycle.
/// May be stale or zero between refreshes; consumers must tolerate both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CachedPrice {
    pub price: f64,
    pub last_updated: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn classify_by_age_thresholds() {
        assert_eq!(
            WalletAge::classify(Some("2025-06-25T00:00:00Z"), now()),
            WalletAge::Baby
        );
        assert_eq!(
            WalletAge::classify(Some("2025-03-01T00:00:00Z"), now()),
            WalletAge::Adult
        );
        assert_eq!(
            WalletAge::classify(Some("2023-01-01T00:00:00Z"), now()),
            WalletAge::Old
        );
    }

    #[test]
    fn classify_missing_or_garbage_is_unknown() {
        assert_eq!(WalletAge::classify(None, now()), WalletAge::Unknown);
        assert_eq!(
            WalletAge::classify(Some("not a timestamp"), now()),
            WalletAge::Unknown
        );
    }

    #[test]
    fn wallet_age_counts_sum_excludes_unknown() {
        let mut counts = WalletAgeCounts::default();
        counts.record(WalletAge::Baby);
        counts.record(WalletAge::Adult);
        counts.record(WalletAge::Old);
        counts.record(WalletAge::Unknown);
        assert_eq!(counts.categorized(), 3);
        assert_eq!(counts.unknown, 1);
    }

    #[test]
    fn axiom_metrics_wire_names() {
        let metrics = AxiomMetrics::default();
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("marketCapUSD").is_some());
        assert!(json.get("fibLevel62").is_some());
        assert!(json.get("walletAgeCounts").is_some());
        assert!(json.get("top10HoldersPercent").is_some());
    }
}
