//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the status database is unreachable.
    pub status: &'static str,
    /// Object store backend name.
    pub store: String,
    pub database: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.documents().ping() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Status database check failed");
            false
        }
    };

    let (code, status) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            store: state.objects().name().to_string(),
            database: if database_ok { "ok" } else { "unavailable" },
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
