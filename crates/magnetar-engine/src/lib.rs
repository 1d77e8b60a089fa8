//! magnetar-engine — Thompson-sampling recommendations.
//!
//! Each worker is a Bernoulli arm with a Beta(successes + 1, failures + 1)
//! posterior. A recommendation draws one sample per arm and picks the
//! largest.
//!
//! # Architecture
//!
//! ```text
//! Recommender
//!   ├── StatsStore    (snapshot per request)
//!   └── RandomSource  (shared, one Beta draw per worker)
//! ```

pub mod error;
pub mod recommender;

pub use error::{EngineError, EngineResult};
pub use recommender::{Recommendation, Recommender, WorkerSample, select_best};
