use inkwell_api::setup::{self, server};
use inkwell_core::telemetry::init_tracing;
use inkwell_core::Config;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    init_tracing(
        "inkwell_api=info,inkwell_worker=info,inkwell_mail=info,inkwell_storage=info,tower_http=info",
        config.base.log_format,
    );

    let shutdown = CancellationToken::new();
    let app = setup::initialize_app(&config, shutdown.clone()).await?;

    let served = server::start_server(&config, app.router).await;

    // The image worker finishes its current job and fails the rest; the
    // drain worker (owner role) runs one last cycle.
    shutdown.cancel();
    for task in app.background {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task failed");
        }
    }

    tracing::info!("Server stopped");
    served
}
