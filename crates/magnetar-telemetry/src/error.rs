//! Telemetry error types.

use thiserror::Error;

/// Errors reading from the event stream. All of them are transient except
/// [`TelemetryError::Closed`].
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid stream endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("stream responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed stream response: {0}")]
    Response(#[from] serde_json::Error),

    #[error("no stream endpoints configured")]
    NoEndpoints,

    /// The source will never yield another message.
    #[error("telemetry source closed")]
    Closed,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// A single record that could not be turned into an observation. The
/// record is dropped; it is never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("decode telemetry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry missing workerUrl")]
    MissingWorker,
}
