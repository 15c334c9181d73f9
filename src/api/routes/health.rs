//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the default room is accepting clients.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_default_room(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with room and session counts.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let default_room_ok = check_default_room(&state).await;
    let status = if default_room_ok { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        rooms: state.registry.room_count().await,
        sessions: state.registry.session_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The default room exists and its hub is running
async fn check_default_room(state: &AppState) -> bool {
    match state.registry.lookup_room(state.default_room()).await {
        Ok(room) => !room.is_closed(),
        Err(_) => false,
    }
}
