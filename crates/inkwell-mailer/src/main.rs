//! Mail queue owner.
//!
//! Holds the email FIFO, accepts messages from other Inkwell processes over
//! the named channel and drains the FIFO to SMTP on a fixed cadence.

use std::sync::Arc;

use inkwell_core::telemetry::init_tracing;
use inkwell_core::{shutdown_signal, Config};
use inkwell_mail::{
    DrainWorker, EmailSender, LocalEmailQueue, PipeEndpoint, PipeListener, SmtpEmailSender,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    init_tracing(
        "inkwell_mailer=info,inkwell_mail=info",
        config.base.log_format,
    );
    config.validate_smtp()?;

    let sender: Arc<dyn EmailSender> = Arc::new(SmtpEmailSender::from_config(&config.smtp)?);
    let queue = Arc::new(LocalEmailQueue::new());
    let endpoint = PipeEndpoint::new(config.mail.pipe_name.clone());

    tracing::info!(
        endpoint = %endpoint,
        drain_interval_secs = config.mail.drain_interval.as_secs(),
        dedup_retention_secs = config.mail.dedup_retention.as_secs(),
        "Starting mailer"
    );

    let stop_listener = CancellationToken::new();
    let stop_drain = CancellationToken::new();

    let listener = PipeListener::new(
        endpoint,
        queue.clone(),
        config.mail.max_instances,
        config.mail.listener_backoff,
    );
    let listener = tokio::spawn(listener.run(stop_listener.clone()));

    let drain = DrainWorker::new(
        queue,
        sender,
        config.mail.drain_interval,
        config.mail.dedup_retention,
    );
    let drain = tokio::spawn(drain.run(stop_drain.clone()));

    shutdown_signal().await;

    // Listener first so nothing new lands after the final drain cycle.
    stop_listener.cancel();
    if let Err(e) = listener.await {
        tracing::error!(error = %e, "Mail queue listener task failed");
    }
    stop_drain.cancel();
    if let Err(e) = drain.await {
        tracing::error!(error = %e, "Email drain worker task failed");
    }

    tracing::info!("Mailer stopped");
    Ok(())
}
