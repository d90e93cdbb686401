//! Append-only snapshot history.
//!
//! Persists one JSON object per line to a main NDJSON log plus a duplicate
//! date-partitioned log, and mirrors the tail of the log in a bounded in-memory
//! ring for the read path. Append is the sole mutation; there is exactly one
//! writer (the fetch loop), so a lock scoped to the ring update is enough for
//! readers to always observe pre- or post-append state. The running maximum USD
//! market cap is maintained incrementally so fib derivation never rescans
//! history.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::models::snapshot::Snapshot;

const LOG_FILE: &str = "snapshots.ndjson";
const PARTITION_PREFIX: &str = "snapshots-";
const PARTITION_SUFFIX: &str = ".ndjson";

#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<RwLock<Ring>>,
    data_dir: PathBuf,
    max_entries: usize,
}

struct Ring {
    entries: VecDeque<Snapshot>,
    max_mc_usd: f64,
}

impl HistoryStore {
    /// Open (or create) the store under `data_dir`, reloading the tail of the
    /// existing log into memory. Corrupt lines are skipped with a warning.
    pub fn open(
        data_dir: impl Into<PathBuf>,
        max_entries: usize,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let mut entries = VecDeque::new();
        let mut max_mc_usd: f64 = 0.0;
        let log_path = data_dir.join(LOG_FILE);
        if log_path.exists() {
            let reader = BufReader::new(fs::File::open(&log_path)?);
            let mut skipped = 0usize;
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Snapshot>(&line) {
                    Ok(snapshot) => {
                        if let Some(mc) = snapshot.axiom.market_cap_usd {
                            max_mc_usd = max_mc_usd.max(mc);
                        }
                        entries.push_back(snapshot);
                        if entries.len() > max_entries {
                            entries.pop_front();
                        }
                    }
                    Err(_) => skipped += 1,
                }
            }
            if skipped > 0 {
                warn!("skipped {} corrupt history lines in {:?}", skipped, log_path);
            }
            info!("reloaded {} snapshots from {:?}", entries.len(), log_path);
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(Ring {
                entries,
                max_mc_usd,
            })),
            data_dir,
            max_entries,
        })
    }

    /// Append one snapshot: write-and-flush to the main log and the current
    /// date partition, then publish to the ring. A disk failure leaves the ring
    /// untouched so readers never see an unpersisted snapshot.
    pub fn append(
        &self,
        snapshot: &Snapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let line = serde_json::to_string(snapshot)?;
        append_line(&self.data_dir.join(LOG_FILE), &line)?;

        let partition = format!(
            "{PARTITION_PREFIX}{}{PARTITION_SUFFIX}",
            snapshot.timestamp.date_naive()
        );
        if let Err(e) = append_line(&self.data_dir.join(partition), &line) {
            // the main log is authoritative; a partition miss only affects retention
            warn!("failed to write date partition: {}", e);
        }

        let mut ring = self.inner.write();
        if let Some(mc) = snapshot.axiom.market_cap_usd {
            ring.max_mc_usd = ring.max_mc_usd.max(mc);
        }
        ring.entries.push_back(snapshot.clone());
        while ring.entries.len() > self.max_entries {
            ring.entries.pop_front();
        }
        Ok(())
    }

    /// Most recently appended snapshot; None on an empty store, never an error.
    pub fn latest(&self) -> Option<Snapshot> {
        self.inner.read().entries.back().cloned()
    }

    pub fn all(&self) -> Vec<Snapshot> {
        self.inner.read().entries.iter().cloned().collect()
    }

    /// Last `n` snapshots in original append order.
    pub fn tail(&self, n: usize) -> Vec<Snapshot> {
        let ring = self.inner.read();
        let skip = ring.entries.len().saturating_sub(n);
        ring.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Running maximum USD market cap across everything ever appended (not just
    /// the in-memory tail). Zero on an empty store.
    pub fn max_market_cap_usd(&self) -> f64 {
        self.inner.read().max_mc_usd
    }

    /// Path of the raw NDJSON log, for the download endpoint.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Delete date-partitioned logs beyond the newest `retain`. Returns the
    /// number of partitions removed. The main log is never pruned.
    pub fn prune_partitions(
        &self,
        retain: usize,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut partitions: Vec<PathBuf> = fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_partition(path))
            .collect();

        // ISO dates in the file names make lexicographic order chronological
        partitions.sort();

        let excess = partitions.len().saturating_sub(retain);
        for path in partitions.into_iter().take(excess) {
            fs::remove_file(&path)?;
            info!("pruned history partition {:?}", path);
        }
        Ok(excess)
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

fn is_partition(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some(date) = name
        .strip_prefix(PARTITION_PREFIX)
        .and_then(|rest| rest.strip_suffix(PARTITION_SUFFIX))
    else {
        return false;
    };
    date.parse::<chrono::NaiveDate>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::AxiomMetrics;
    use crate::models::social::XData;
    use chrono::{Duration, TimeZone, Utc};

    fn snapshot(seq: i64, mc: Option<f64>) -> Snapshot {
        Snapshot {
            timestamp: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
                + Duration::seconds(seq),
            axiom: AxiomMetrics {
                market_cap_usd: mc,
                net_count: seq,
                ..AxiomMetrics::default()
            },
            x_data: XData::empty(),
            unique_authors: 0,
            author_followers: Vec::new(),
        }
    }

    #[test]
    fn latest_on_empty_store_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 100).unwrap();
        assert!(store.latest().is_none());
        assert!(store.all().is_empty());
        assert_eq!(store.max_market_cap_usd(), 0.0);
    }

    #[test]
    fn tail_returns_last_k_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 100).unwrap();
        for seq in 0..10 {
            store.append(&snapshot(seq, None)).unwrap();
        }
        let tail = store.tail(3);
        assert_eq!(tail.len(), 3);
        let seqs: Vec<i64> = tail.iter().map(|s| s.axiom.net_count).collect();
        assert_eq!(seqs, vec![7, 8, 9]);
        assert_eq!(store.tail(99).len(), 10);
    }

    #[test]
    fn timestamps_are_strictly_increasing_in_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 100).unwrap();
        for seq in 0..5 {
            store.append(&snapshot(seq, None)).unwrap();
        }
        let all = store.all();
        for pair in all.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 3).unwrap();
        for seq in 0..5 {
            store.append(&snapshot(seq, None)).unwrap();
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.all()[0].axiom.net_count, 2);
    }

    #[test]
    fn reopen_reloads_tail_and_running_max() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = HistoryStore::open(dir.path(), 2).unwrap();
            store.append(&snapshot(0, Some(50_000.0))).unwrap();
            store.append(&snapshot(1, Some(10_000.0))).unwrap();
            store.append(&snapshot(2, None)).unwrap();
        }
        let store = HistoryStore::open(dir.path(), 2).unwrap();
        // ring keeps only the tail, but the max spans the whole log
        assert_eq!(store.len(), 2);
        assert_eq!(store.max_market_cap_usd(), 50_000.0);
        assert_eq!(store.latest().unwrap().axiom.net_count, 2);
    }

    #[test]
    fn corrupt_log_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = HistoryStore::open(dir.path(), 10).unwrap();
            store.append(&snapshot(0, None)).unwrap();
        }
        append_line(&dir.path().join(LOG_FILE), "{not valid json").unwrap();
        {
            let store = HistoryStore::open(dir.path(), 10).unwrap();
            store.append(&snapshot(1, None)).unwrap();
        }
        let store = HistoryStore::open(dir.path(), 10).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn prune_keeps_newest_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 10).unwrap();
        for day in 1..=5 {
            let name = format!("snapshots-2025-07-0{day}.ndjson");
            append_line(&dir.path().join(name), "{}").unwrap();
        }
        // unrelated files are left alone
        append_line(&dir.path().join("notes.txt"), "keep me").unwrap();

        let removed = store.prune_partitions(2).unwrap();
        assert_eq!(removed, 3);
        assert!(!dir.path().join("snapshots-2025-07-01.ndjson").exists());
        assert!(dir.path().join("snapshots-2025-07-04.ndjson").exists());
        assert!(dir.path().join("snapshots-2025-07-05.ndjson").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn append_writes_date_partition() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 10).unwrap();
        store.append(&snapshot(0, None)).unwrap();
        assert!(dir.path().join("snapshots-2025-07-01.ndjson").exists());
    }
}
