//! The snapshot fetch loop: fetch -> derive -> persist -> broadcast.
//!
//! One spawned task drives the whole cycle on a fixed interval. Cycles run
//! strictly one at a time (sequential awaits inside a single task), which is
//! what guarantees snapshots land in increasing time order. Any error inside a
//! cycle is logged and the loop continues to the next tick; the only way the
//! loop ends is the market-cap circuit breaker.

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::config::ExitPolicy;
use crate::models::snapshot::Snapshot;
use crate::services::metrics::derive_snapshot;
use crate::{AppState, TrackerTarget};

pub fn start_snapshot_sync_job(state: AppState) {
    tokio::spawn(async move {
        info!(
            "starting snapshot sync (every {} seconds)",
            state.settings.fetch_interval_secs
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(state.settings.fetch_interval_secs));
        let mut watchdog = MarketCapWatchdog::new(state.settings.exit.clone());

        loop {
            interval.tick().await;

            let Some(target) = state.tracker.get() else {
                debug!("waiting for configuration");
                continue;
            };

            match run_cycle(&state, &target).await {
                Ok(snapshot) => {
                    if watchdog.observe(snapshot.axiom.market_cap_usd) {
                        error!(
                            "market cap below exit threshold for the full grace period, \
                             shutting down"
                        );
                        std::process::exit(0);
                    }
                }
                Err(e) => error!("snapshot cycle failed: {}", e),
            }
        }
    });
}

/// One full cycle. Upstream failures degrade fields inside the snapshot; only a
/// persistence failure abandons the cycle (retried implicitly on the next tick,
/// with nothing partial appended or broadcast).
async fn run_cycle(
    state: &AppState,
    target: &TrackerTarget,
) -> Result<Snapshot, Box<dyn std::error::Error + Send + Sync>> {
    debug!("starting fetch cycle for pair {}", target.pair_address);

    let trading = state.axiom.fetch_trading_data(&target.pair_address).await;
    let social = state.x_api.fetch_social_data(&target.community_id).await;
    let holders = state.axiom.fetch_holders(&target.pair_address).await;

    let snapshot = derive_snapshot(
        &trading,
        social,
        holders,
        state.sol_price.current(),
        state.history.max_market_cap_usd(),
        state.settings.min_market_cap_usd,
    );

    state.history.append(&snapshot)?;
    state.broadcaster.publish(snapshot.clone());

    info!(
        "snapshot appended (marketCapUSD: {:?}, holders: {:?}, authors: {})",
        snapshot.axiom.market_cap_usd, snapshot.axiom.num_holders, snapshot.unique_authors
    );
    Ok(snapshot)
}

/// Deliberate circuit breaker: tracks the peak market cap across the run and
/// trips once the current cap stays below the absolute floor or below the
/// configured fraction of that peak for the full grace period. Transient dips
/// reset the timer.
pub struct MarketCapWatchdog {
    policy: ExitPolicy,
    peak_usd: f64,
    breached_since: Option<Instant>,
}

impl MarketCapWatchdog {
    pub fn new(policy: ExitPolicy) -> Self {
        Self {
            policy,
            peak_usd: 0.0,
            breached_since: None,
        }
    }

    /// Feed one cycle's market cap; true means the process should terminate.
    pub fn observe(&mut self, market_cap_usd: Option<f64>) -> bool {
        self.observe_at(market_cap_usd, Instant::now())
    }

    fn observe_at(&mut self, market_cap_usd: Option<f64>, now: Instant) -> bool {
        if !self.policy.enabled {
            return false;
        }
        // "no data" is an upstream outage, not a collapse
        let Some(mc) = market_cap_usd else {
            return false;
        };

        self.peak_usd = self.peak_usd.max(mc);
        let breached =
            mc < self.policy.floor_usd || mc < self.peak_usd * self.policy.peak_fraction;
        if !breached {
            self.breached_since = None;
            return false;
        }

        let since = *self.breached_since.get_or_insert(now);
        now.duration_since(since) >= self.policy.grace
    }
}
