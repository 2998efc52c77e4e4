//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use inkwell_core::Config;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// A ready-to-serve application and the background tasks it started.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub background: Vec<JoinHandle<()>>,
}

/// Build services, start background workers and assemble the router.
///
/// Background tasks run until `shutdown` is cancelled.
pub async fn initialize_app(config: &Config, shutdown: CancellationToken) -> Result<Application> {
    let services = services::initialize_services(config, shutdown).await?;
    let router = routes::setup_routes(config, services.state.clone());

    Ok(Application {
        state: services.state,
        router,
        background: services.background,
    })
}
