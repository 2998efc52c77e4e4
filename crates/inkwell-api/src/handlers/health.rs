use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub image_worker: &'static str,
    pub queued_jobs: usize,
    pub pending_uploads: usize,
    pub mail_queue_role: String,
}

/// Report image worker liveness and queue depth.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let running = state.uploads.is_running();
    let response = HealthCheckResponse {
        status: if running { "healthy" } else { "unhealthy" },
        image_worker: if running { "running" } else { "stopped" },
        queued_jobs: state.uploads.queued_jobs(),
        pending_uploads: state.uploads.pending_uploads(),
        mail_queue_role: state.mail_role.to_string(),
    };

    let status_code = if running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
