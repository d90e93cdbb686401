//! Process configuration loaded from environment variables.
//!
//! Static settings (addresses, intervals, thresholds) come from the environment at
//! startup; the runtime tracker target (pair address, community id) is separate
//! state, mutated only through the config endpoint.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Directory holding the NDJSON log and its date partitions.
    pub data_dir: PathBuf,
    /// Fetch-cycle interval for the snapshot loop.
    pub fetch_interval_secs: u64,
    /// Refresh interval for the cached SOL/USD reference price.
    pub price_interval_secs: u64,
    /// In-memory ring capacity; the on-disk log is unbounded.
    pub history_max_entries: usize,
    /// Date partitions kept by the retention job.
    pub retention_partitions: usize,
    /// Fixed floor used as the fib retracement baseline.
    pub min_market_cap_usd: f64,
    pub exit: ExitPolicy,
}

/// Circuit-breaker thresholds for the market-cap watchdog. All configuration,
/// disabled unless explicitly enabled.
#[derive(Debug, Clone)]
pub struct ExitPolicy {
    pub enabled: bool,
    /// Absolute USD floor; below it the breach timer runs.
    pub floor_usd: f64,
    /// Fraction of the observed peak; below it the breach timer runs.
    pub peak_fraction: f64,
    /// The breach must persist continuously this long before the process exits.
    pub grace: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5050".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            fetch_interval_secs: env_parse("FETCH_INTERVAL_SECS", 3),
            price_interval_secs: env_parse("PRICE_UPDATE_INTERVAL_SECS", 600),
            history_max_entries: env_parse("HISTORY_MAX_ENTRIES", 2000),
            retention_partitions: env_parse("RETENTION_PARTITIONS", 7),
            min_market_cap_usd: env_parse("MIN_MARKET_CAP_USD", 5750.0),
            exit: ExitPolicy {
                enabled: env_parse("EXIT_WATCHDOG_ENABLED", false),
                floor_usd: env_parse("EXIT_MC_FLOOR_USD", 4000.0),
                peak_fraction: env_parse("EXIT_PEAK_FRACTION", 0.5),
                grace: Duration::from_secs(env_parse("EXIT_GRACE_SECS", 180)),
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5050".to_string(),
            data_dir: PathBuf::from("data"),
            fetch_interval_secs: 3,
            price_interval_secs: 600,
            history_max_entries: 2000,
            retention_partitions: 7,
            min_market_cap_usd: 5750.0,
            exit: ExitPolicy {
                enabled: false,
                floor_usd: 4000.0,
                peak_fraction: 0.5,
                grace: Duration::from_secs(180),
            },
        }
    }
}
