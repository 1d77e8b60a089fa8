//! HTTP handlers.
//!
//! Success bodies are the bare JSON documents routers already consume;
//! failures use a `{ "success": false, "error": ... }` envelope.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::warn;

use magnetar_engine::EngineError;

use crate::ApiState;

#[derive(serde::Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: msg.to_string(),
        }),
    )
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

/// GET /stats
pub async fn stats(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

/// GET /recommendation
pub async fn recommendation(State(state): State<ApiState>) -> impl IntoResponse {
    match state.recommender.recommend() {
        Ok(rec) => Json(rec).into_response(),
        Err(e @ EngineError::NoWorkersTracked) => {
            warn!(error = %e, "recommendation unavailable");
            error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

/// GET /ingest/stats
pub async fn ingest_stats(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.ingest.snapshot())
}
