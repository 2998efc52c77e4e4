//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use inkwell_core::{Config, StorageBackend};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{email, health, images};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Path local media is served under, matching the default public base URL.
pub const LOCAL_MEDIA_PATH: &str = "/media";

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/images", post(images::upload_image))
        .route(
            "/api/articles/{id}/images",
            post(images::upload_article_image),
        )
        .route("/api/emails", post(email::enqueue_email))
        .route("/health", get(health::health_check))
        .layer(RequestBodyLimitLayer::new(
            config.upload.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(DefaultBodyLimit::disable())
        .with_state(state);

    let app = match (&config.storage.backend, &config.storage.local_storage_path) {
        (StorageBackend::Local, Some(path)) => {
            tracing::info!(path = %path, route = LOCAL_MEDIA_PATH, "Serving local media");
            api.nest_service(LOCAL_MEDIA_PATH, ServeDir::new(path))
        }
        _ => api,
    };

    app.layer(TraceLayer::new_for_http())
}
