//! Recommendation error types.

use thiserror::Error;

/// Errors that can occur while producing a recommendation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no workers tracked")]
    NoWorkersTracked,
}

pub type EngineResult<T> = Result<T, EngineError>;
