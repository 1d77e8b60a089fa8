//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading learner configuration. All of them are fatal
/// at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read worker config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse worker config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no worker URLs configured in {0}; learner cannot start")]
    Empty(PathBuf),
}
