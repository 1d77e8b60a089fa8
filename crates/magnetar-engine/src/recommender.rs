//! Thompson-sampling recommender.
//!
//! Ties are broken by snapshot order: the snapshot is sorted by worker
//! identity, and the first worker holding the greatest sample wins. Exact
//! ties between continuous draws are practically unreachable, but the order
//! is fixed so the outcome is reproducible under a seeded source.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use magnetar_core::WorkerId;
use magnetar_sampler::{RandomSource, sample_beta};
use magnetar_stats::StatsStore;

use crate::error::{EngineError, EngineResult};

/// One worker's draw for a single recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSample {
    pub worker_url: WorkerId,
    pub sample: f64,
    /// Posterior mean α / (α + β).
    pub mean: f64,
    pub successes: u64,
    pub failures: u64,
}

/// The chosen worker together with every sample that went into the choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub worker_url: WorkerId,
    pub sampled_score: f64,
    pub generated_at: DateTime<Utc>,
    pub scores: Vec<WorkerSample>,
}

/// Produces recommendations from the live statistics store.
///
/// Clones share the store and the random source.
#[derive(Clone)]
pub struct Recommender {
    store: StatsStore,
    random: Arc<RandomSource>,
}

impl Recommender {
    pub fn new(store: StatsStore, random: Arc<RandomSource>) -> Self {
        Self { store, random }
    }

    /// Sample every tracked worker's posterior and pick the best.
    pub fn recommend(&self) -> EngineResult<Recommendation> {
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            return Err(EngineError::NoWorkersTracked);
        }

        let scores: Vec<WorkerSample> = snapshot
            .into_iter()
            .map(|(worker_url, stats)| {
                let alpha = stats.successes as f64 + 1.0;
                let beta = stats.failures as f64 + 1.0;
                WorkerSample {
                    worker_url,
                    sample: sample_beta(alpha, beta, self.random.as_ref()),
                    mean: alpha / (alpha + beta),
                    successes: stats.successes,
                    failures: stats.failures,
                }
            })
            .collect();

        let best = select_best(&scores).ok_or(EngineError::NoWorkersTracked)?;
        let chosen = &scores[best];
        debug!(
            worker = %chosen.worker_url,
            score = chosen.sample,
            candidates = scores.len(),
            "recommendation sampled"
        );

        Ok(Recommendation {
            worker_url: chosen.worker_url.clone(),
            sampled_score: chosen.sample,
            generated_at: Utc::now(),
            scores,
        })
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }
}

/// Index of the sample with the strictly greatest value; first wins ties.
///
/// NaN samples rank below every real value. Returns `None` only for an
/// empty slice.
pub fn select_best(samples: &[WorkerSample]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, s) in samples.iter().enumerate() {
        let score = if s.sample.is_nan() {
            f64::NEG_INFINITY
        } else {
            s.sample
        };
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}
