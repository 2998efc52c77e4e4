//! Server startup and graceful shutdown

use anyhow::Result;
use axum::Router;
use inkwell_core::{shutdown_signal, Config};

/// Serve `app` until SIGINT or SIGTERM, then stop accepting connections and
/// let in-flight requests finish.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        max_image_mb = config.upload.max_file_size_bytes / 1024 / 1024,
        image_extensions = %config.upload.allowed_extensions.join(","),
        storage_backend = %config.storage.backend,
        mail_queue_role = %config.mail.role,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
