//! Event stream abstraction.

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::{TelemetryError, TelemetryResult};

/// A stream of raw outcome records.
///
/// `next_message` blocks until a record is available. Dropping the returned
/// future must be safe: the ingestion loop races it against shutdown.
pub trait TelemetrySource: Send {
    /// Next raw record. Transient failures are returned as errors and the
    /// caller retries; [`TelemetryError::Closed`] ends ingestion.
    fn next_message(&mut self) -> impl Future<Output = TelemetryResult<Vec<u8>>> + Send;

    /// Release any resources held on the remote side.
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// In-process source backed by an mpsc channel.
///
/// Closes once every sender has been dropped and the buffer is drained.
pub struct ChannelSource {
    rx: mpsc::Receiver<TelemetryResult<Vec<u8>>>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<TelemetryResult<Vec<u8>>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl TelemetrySource for ChannelSource {
    async fn next_message(&mut self) -> TelemetryResult<Vec<u8>> {
        self.rx.recv().await.unwrap_or(Err(TelemetryError::Closed))
    }
}
