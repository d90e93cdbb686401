//! Axiom trading-API client.
//!
//! Issues one GET per named endpoint (pair info, token info, pair stats, token
//! holders). Every call is independently fallible: a timeout, transport error or
//! non-200 yields an empty document for that name instead of failing the batch.
//! This layer never raises to its caller.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::models::snapshot::{HolderInfo, WalletAge};

const PAIR_API_BASE: &str = "https://api9.axiom.trade";
const TOKEN_API_BASE: &str = "https://api10.axiom.trade";
const HOLDER_API_BASE: &str = "https://api6.axiom.trade";

#[derive(Clone)]
pub struct AxiomService {
    client: Client,
    /// Session cookie string; credentials are configuration, not logic.
    cookie: Option<String>,
}

impl AxiomService {
    pub fn new(cookie: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("failed to build HTTP client");

        Self { client, cookie }
    }

    /// The four named trading endpoints for one pair. Failed endpoints map to an
    /// empty object so downstream field extraction degrades per-field.
    pub async fn fetch_trading_data(&self, pair_address: &str) -> HashMap<String, Value> {
        let endpoints = [
            (
                "pair_info",
                format!("{PAIR_API_BASE}/pair-info?pairAddress={pair_address}"),
            ),
            (
                "token_info",
                format!("{PAIR_API_BASE}/token-info?pairAddress={pair_address}"),
            ),
            (
                "pair_stats",
                format!("{PAIR_API_BASE}/pair-stats?pairAddress={pair_address}"),
            ),
            (
                "token_holders",
                format!("{TOKEN_API_BASE}/token-info?pairAddress={pair_address}"),
            ),
        ];

        let mut data = HashMap::new();
        for (name, url) in endpoints {
            match self.get_json(&url).await {
                Ok(value) => {
                    debug!("fetched axiom {}", name);
                    data.insert(name.to_string(), value);
                }
                Err(e) => {
                    warn!("axiom {} fetch failed: {}", name, e);
                    data.insert(name.to_string(), json!({}));
                }
            }
        }
        data
    }

    /// Holder wallets for the pair, deduplicated by address in first-seen order,
    /// each categorized by funding-timestamp age. Failure yields an empty list.
    pub async fn fetch_holders(&self, pair_address: &str) -> Vec<HolderInfo> {
        let url = format!(
            "{HOLDER_API_BASE}/holder-data-v3?pairAddress={pair_address}&onlyTrackedWallets=false"
        );
        match self.get_json(&url).await {
            Ok(payload) => {
                let holders = build_holders(&payload);
                debug!("fetched {} unique holder wallets", holders.len());
                holders
            }
            Err(e) => {
                warn!("holder data fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_json(
        &self,
        url: &str,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let mut request = self
            .client
            .get(url)
            .header("accept", "application/json, text/plain, */*")
            .header("content-type", "application/json")
            .header("origin", "https://axiom.trade")
            .header("referer", "https://axiom.trade/")
            .header(
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36",
            );
        if let Some(cookie) = &self.cookie {
            request = request.header("cookie", cookie);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(format!("Axiom API error: {}", response.status()).into());
        }
        Ok(response.json().await?)
    }
}

/// Extract deduplicated holder records from the holder-data payload. The API
/// returns either a list of wallet objects or a single object; anything else
/// reads as no holders.
pub fn build_holders(payload: &Value) -> Vec<HolderInfo> {
    let single_entry;
    let entries: &[Value] = match payload {
        Value::Array(items) => items,
        Value::Object(_) => {
            single_entry = [payload.clone()];
            &single_entry
        }
        _ => return Vec::new(),
    };

    let now = Utc::now();
    let mut seen = std::collections::HashSet::new();
    let mut holders = Vec::new();
    for entry in entries {
        let Some(wallet) = entry.get("walletAddress").and_then(Value::as_str) else {
            continue;
        };
        if !seen.insert(wallet.to_string()) {
            continue;
        }
        let funded_at = entry
            .get("walletFunding")
            .and_then(|wf| wf.get("fundedAt"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let age_category = WalletAge::classify(funded_at.as_deref(), now);
        holders.push(HolderInfo {
            wallet_address: wallet.to_string(),
            funded_at,
            age_category,
        });
    }
    holders
}
