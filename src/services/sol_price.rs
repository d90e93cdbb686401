//! Cached SOL/USD reference price.
//!
//! One mutable value refreshed on its own slow cycle, read by every derivation
//! cycle and by the read endpoints. A failed refresh keeps the previous value;
//! the cache is never overwritten with a zero from a bad fetch. Consumers must
//! tolerate a stale or zero price.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::models::snapshot::CachedPrice;

const COINGECKO_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd";

#[derive(Clone)]
pub struct SolPriceService {
    client: Client,
    cached: Arc<RwLock<CachedPrice>>,
    poll_interval_secs: u64,
}

impl SolPriceService {
    pub fn new(poll_interval_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build HTTP client"),
            cached: Arc::new(RwLock::new(CachedPrice::default())),
            poll_interval_secs,
        }
    }

    /// Spawn the background refresh loop. Runs once immediately, then on the
    /// configured interval, independently of the snapshot fetch loop.
    pub fn start_polling(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            info!(
                "starting SOL price polling (every {} seconds)",
                service.poll_interval_secs
            );

            let mut interval =
                tokio::time::interval(Duration::from_secs(service.poll_interval_secs));
            loop {
                interval.tick().await;
                match service.refresh_once().await {
                    Ok(price) => info!("updated SOL price: ${}", price),
                    Err(e) => error!("SOL price refresh failed: {}", e),
                }
            }
        });
    }

    /// Fetch the price once and update the cache on success only.
    pub async fn refresh_once(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let response = self.client.get(COINGECKO_URL).send().await?;
        if !response.status().is_success() {
            return Err(format!("CoinGecko API error: {}", response.status()).into());
        }

        let payload: serde_json::Value = response.json().await?;
        let Some(price) = payload
            .pointer("/solana/usd")
            .and_then(serde_json::Value::as_f64)
        else {
            warn!("CoinGecko response missing solana.usd field");
            return Err("missing solana.usd in response".into());
        };

        self.store(price);
        Ok(price)
    }

    fn store(&self, price: f64) {
        let mut cached = self.cached.write();
        cached.price = price;
        cached.last_updated = Utc::now().timestamp();
    }

    /// Current cached value; zero with last_updated = 0 before the first
    /// successful refresh.
    pub fn current(&self) -> CachedPrice {
        *self.cached.read()
    }
}
