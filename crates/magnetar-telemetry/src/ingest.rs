//! Telemetry ingestion loop.
//!
//! Pulls records one at a time, decodes them, and applies each outcome to
//! the statistics store. Read errors back off and retry forever; decode
//! errors drop the record. The loop only exits on shutdown or when the
//! source reports [`TelemetryError::Closed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use magnetar_stats::StatsStore;

use crate::error::{DecodeError, TelemetryError};
use crate::event::{Observation, decode};
use crate::source::TelemetrySource;

/// Delay before retrying after a stream read error.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Running totals for the ingestion loop.
#[derive(Debug, Default)]
pub struct IngestCounters {
    applied: AtomicU64,
    dropped: AtomicU64,
    read_errors: AtomicU64,
}

/// Serializable view of [`IngestCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSnapshot {
    pub applied: u64,
    pub dropped: u64,
    pub read_errors: u64,
}

impl IngestCounters {
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Applies decoded telemetry to a [`StatsStore`].
pub struct Ingestor {
    store: StatsStore,
    counters: Arc<IngestCounters>,
    retry_backoff: Duration,
}

impl Ingestor {
    pub fn new(store: StatsStore) -> Self {
        Self {
            store,
            counters: Arc::new(IngestCounters::default()),
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Override the read-error backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Shared handle to the loop's counters.
    pub fn counters(&self) -> Arc<IngestCounters> {
        self.counters.clone()
    }

    /// Decode one record and apply it. A record that fails to decode is
    /// counted as dropped and leaves the store untouched.
    pub fn process_message(&self, payload: &[u8]) -> Result<Observation, DecodeError> {
        let observation = match decode(payload) {
            Ok(observation) => observation,
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.store.record(&observation.worker, observation.success);
        self.counters.applied.fetch_add(1, Ordering::Relaxed);
        Ok(observation)
    }

    /// Run until shutdown is signalled or the source closes.
    pub async fn run<S: TelemetrySource>(
        &self,
        mut source: S,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("telemetry ingestion started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let message = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                message = source.next_message() => message,
            };

            match message {
                Ok(payload) => match self.process_message(&payload) {
                    Ok(obs) => {
                        debug!(worker = %obs.worker, success = obs.success, "telemetry applied");
                    }
                    Err(e) => warn!(error = %e, "telemetry dropped"),
                },
                Err(TelemetryError::Closed) => {
                    info!("telemetry source closed");
                    break;
                }
                Err(e) => {
                    self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %e, backoff_ms = self.retry_backoff.as_millis() as u64, "telemetry read error");
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.retry_backoff) => {}
                    }
                }
            }
        }

        source.close().await;
        info!("telemetry ingestion stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use crate::error::TelemetryResult;
    use tokio::sync::mpsc;

    fn outcome(worker: &str, status: u16) -> TelemetryResult<Vec<u8>> {
        Ok(format!(r#"{{"decision":{{"workerUrl":"{worker}"}},"outcome":{{"statusCode":{status}}}}}"#).into_bytes())
    }

    async fn feed(tx: &mpsc::Sender<TelemetryResult<Vec<u8>>>, items: Vec<TelemetryResult<Vec<u8>>>) {
        for item in items {
            tx.send(item).await.unwrap();
        }
    }

    #[tokio::test]
    async fn applies_outcomes_until_source_closes() {
        let store = StatsStore::new();
        let ingestor = Ingestor::new(store.clone());
        let (tx, source) = ChannelSource::new(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        feed(&tx, vec![outcome("w1", 200), outcome("w1", 503), outcome("w2", 204)]).await;
        drop(tx);

        ingestor.run(source, shutdown_rx).await;

        let w1 = store.get("w1").unwrap();
        assert_eq!((w1.successes, w1.failures), (1, 1));
        let w2 = store.get("w2").unwrap();
        assert_eq!((w2.successes, w2.failures), (1, 0));
        assert_eq!(ingestor.counters().snapshot().applied, 3);
    }

    #[tokio::test]
    async fn malformed_records_are_dropped_and_ingestion_continues() {
        let store = StatsStore::new();
        let ingestor = Ingestor::new(store.clone());
        let (tx, source) = ChannelSource::new(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        feed(
            &tx,
            vec![
                Ok(b"{garbage".to_vec()),
                Ok(br#"{"outcome":{"statusCode":200}}"#.to_vec()),
                Ok(br#"{"decision":{"workerUrl":""},"outcome":{"statusCode":200}}"#.to_vec()),
                outcome("w1", 200),
            ],
        )
        .await;
        drop(tx);

        ingestor.run(source, shutdown_rx).await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("w1").unwrap().successes, 1);
        let counters = ingestor.counters().snapshot();
        assert_eq!(counters.dropped, 3);
        assert_eq!(counters.applied, 1);
    }

    #[tokio::test]
    async fn read_errors_back_off_and_retry() {
        let store = StatsStore::new();
        let ingestor = Ingestor::new(store.clone()).with_retry_backoff(Duration::from_millis(10));
        let (tx, source) = ChannelSource::new(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        feed(
            &tx,
            vec![
                Err(TelemetryError::Transport("connection reset".into())),
                Err(TelemetryError::Status { status: 502, body: "bad gateway".into() }),
                outcome("w1", 500),
            ],
        )
        .await;
        drop(tx);

        ingestor.run(source, shutdown_rx).await;

        assert_eq!(store.get("w1").unwrap().failures, 1);
        assert_eq!(ingestor.counters().snapshot().read_errors, 2);
    }

    #[tokio::test]
    async fn shutdown_interrupts_blocked_read() {
        let store = StatsStore::new();
        let ingestor = Arc::new(Ingestor::new(store.clone()));
        let (tx, source) = ChannelSource::new(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = ingestor.clone();
        let handle = tokio::spawn(async move { runner.run(source, shutdown_rx).await });

        tx.send(outcome("w1", 200)).await.unwrap();
        // Wait until the record is applied, then leave the loop blocked.
        for _ in 0..100 {
            if store.get("w1").is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("ingestion did not stop")
            .unwrap();

        assert_eq!(store.get("w1").unwrap().successes, 1);
        drop(tx);
    }

    #[tokio::test]
    async fn shutdown_interrupts_backoff() {
        let store = StatsStore::new();
        let ingestor = Arc::new(Ingestor::new(store).with_retry_backoff(Duration::from_secs(60)));
        let (tx, source) = ChannelSource::new(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(Err(TelemetryError::Transport("down".into()))).await.unwrap();

        let runner = ingestor.clone();
        let handle = tokio::spawn(async move { runner.run(source, shutdown_rx).await });

        for _ in 0..100 {
            if ingestor.counters().snapshot().read_errors == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("backoff was not cancelled")
            .unwrap();
        drop(tx);
    }

    #[tokio::test]
    async fn already_signalled_shutdown_skips_reading() {
        let store = StatsStore::new();
        let ingestor = Ingestor::new(store.clone());
        let (tx, source) = ChannelSource::new(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        feed(&tx, vec![outcome("w1", 200)]).await;
        ingestor.run(source, shutdown_rx).await;

        assert!(store.is_empty());
    }
}
