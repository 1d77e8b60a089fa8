//! Worker statistics store.
//!
//! A single readers/writer lock guards the whole map. Worker cardinality is
//! small and every critical section is O(1) per entry, so there is no
//! per-worker locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use magnetar_core::WorkerId;

/// Cumulative outcome counters for one worker.
///
/// Both counters only ever grow for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub successes: u64,
    pub failures: u64,
    pub last_updated: DateTime<Utc>,
}

impl WorkerStats {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            successes: 0,
            failures: 0,
            last_updated: now,
        }
    }

    /// Total number of observed outcomes.
    pub fn observations(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Point-in-time copy of the store, ordered by worker identity.
pub type StatsSnapshot = BTreeMap<WorkerId, WorkerStats>;

/// Concurrency-safe map from worker identity to [`WorkerStats`].
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct StatsStore {
    workers: Arc<RwLock<HashMap<WorkerId, WorkerStats>>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-valued entry for `worker` if it does not exist yet.
    pub fn ensure(&self, worker: &str) {
        let mut workers = self.workers.write().expect("stats lock");
        if !workers.contains_key(worker) {
            workers.insert(worker.to_string(), WorkerStats::new(Utc::now()));
            debug!(%worker, "registered worker");
        }
    }

    /// Apply one outcome to `worker`, creating its entry if absent.
    pub fn record(&self, worker: &str, success: bool) {
        let now = Utc::now();
        let mut workers = self.workers.write().expect("stats lock");
        let stats = workers
            .entry(worker.to_string())
            .or_insert_with(|| WorkerStats::new(now));
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        stats.last_updated = now;
    }

    /// Copy every entry out under the read lock.
    ///
    /// The returned map owns its values; later writes never show up in it.
    pub fn snapshot(&self) -> StatsSnapshot {
        let workers = self.workers.read().expect("stats lock");
        workers
            .iter()
            .map(|(worker, stats)| (worker.clone(), *stats))
            .collect()
    }

    /// Counters for a single worker.
    pub fn get(&self, worker: &str) -> Option<WorkerStats> {
        let workers = self.workers.read().expect("stats lock");
        workers.get(worker).copied()
    }

    /// Tracked worker identities, sorted.
    pub fn workers(&self) -> Vec<WorkerId> {
        let workers = self.workers.read().expect("stats lock");
        let mut ids: Vec<WorkerId> = workers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.workers.read().expect("stats lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
