//! magnetar-core — configuration and identity types shared by the learner.
//!
//! Every other crate in the workspace keys its state by [`WorkerId`]; the
//! daemon uses [`config`] to load the static worker pool at startup.

pub mod config;
pub mod error;

pub use config::{LearnerConfig, WorkerConfig, load_worker_urls, split_and_trim};
pub use error::{ConfigError, ConfigResult};

/// Opaque identity of a worker, typically its base URL.
pub type WorkerId = String;
