//! Learner configuration and the static worker file.
//!
//! The worker file is a JSON document of the form
//! `{"workerUrls": ["http://w1", "http://w2"]}`. Every listed worker is
//! pre-registered at startup so it participates in recommendations before
//! any telemetry about it has arrived.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::WorkerId;
use crate::error::{ConfigError, ConfigResult};

/// On-disk shape of the worker file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    #[serde(default)]
    pub worker_urls: Vec<String>,
}

/// Runtime configuration for the learner daemon.
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    /// Event-stream endpoints, tried in order on reconnect.
    pub kafka_brokers: Vec<String>,
    pub kafka_topic: String,
    pub kafka_group: String,
    pub http_addr: SocketAddr,
    pub worker_config_path: PathBuf,
    /// Long-poll timeout passed to the stream on each read.
    pub poll_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Trimmed, de-duplicated worker identities in file order.
    pub fn normalized(&self) -> Vec<WorkerId> {
        let mut seen = HashSet::new();
        self.worker_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .filter(|url| seen.insert(url.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Load the static worker pool. An empty pool is an error: the learner
/// cannot recommend anything without workers.
pub fn load_worker_urls(path: &Path) -> ConfigResult<Vec<WorkerId>> {
    let config = WorkerConfig::from_file(path)?;
    let workers = config.normalized();
    if workers.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    debug!(path = %path.display(), count = workers.len(), "loaded worker config");
    Ok(workers)
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_and_trim(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
