//! magnetar-api — HTTP surface of the learner.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness with a timestamp |
//! | GET | `/stats` | Per-worker success/failure counters |
//! | GET | `/recommendation` | Thompson-sampled worker choice (503 when no workers) |
//! | GET | `/ingest/stats` | Telemetry ingestion counters |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use magnetar_engine::Recommender;
use magnetar_stats::StatsStore;
use magnetar_telemetry::IngestCounters;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StatsStore,
    pub recommender: Recommender,
    pub ingest: Arc<IngestCounters>,
}

/// Build the learner router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/stats", get(handlers::stats))
        .route("/recommendation", get(handlers::recommendation))
        .route("/ingest/stats", get(handlers::ingest_stats))
        .with_state(state)
}
