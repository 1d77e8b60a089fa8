//! magnetar-telemetry — turns routing outcomes into worker statistics.
//!
//! The router publishes one JSON record per proxied request. This crate
//! decodes those records, derives a success flag, and applies it to the
//! [`StatsStore`](magnetar_stats::StatsStore).
//!
//! # Architecture
//!
//! ```text
//! TelemetrySource (trait)
//!   ├── RestProxySource  ← Kafka REST Proxy consumer group (production)
//!   └── ChannelSource    ← in-process mpsc channel
//!          │
//!          ▼
//! Ingestor::run()  ── decode ── derive success ──► StatsStore::record()
//!   └── IngestCounters (applied / dropped / read errors)
//! ```

pub mod error;
pub mod event;
pub mod ingest;
pub mod rest_proxy;
pub mod source;

pub use error::{DecodeError, TelemetryError, TelemetryResult};
pub use event::{Observation, OutcomeEvent, decode};
pub use ingest::{IngestCounters, IngestSnapshot, Ingestor, RETRY_BACKOFF};
pub use rest_proxy::{RestProxyConfig, RestProxySource};
pub use source::{ChannelSource, TelemetrySource};
