//! Owning side of the mail queue bridge.
//!
//! The listener cycles Idle -> Accepting -> Receiving -> Merging -> Idle, one
//! connection and one message at a time. An accept or receive error throws
//! the channel away; a fresh one is bound after `backoff`. Only the shutdown
//! token ends the loop.

use std::sync::Arc;
use std::time::Duration;

use inkwell_core::models::EmailMessage;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::queue::LocalEmailQueue;
use crate::transport::{PipeEndpoint, ServerChannel};

/// Upper bound on one serialized message.
const MAX_MESSAGE_BYTES: u64 = 1024 * 1024;

#[derive(Debug)]
enum Received {
    Message(EmailMessage),
    Empty,
    Malformed(serde_json::Error),
}

pub struct PipeListener {
    endpoint: PipeEndpoint,
    queue: Arc<LocalEmailQueue>,
    max_instances: usize,
    backoff: Duration,
}

impl PipeListener {
    pub fn new(
        endpoint: PipeEndpoint,
        queue: Arc<LocalEmailQueue>,
        max_instances: usize,
        backoff: Duration,
    ) -> Self {
        Self {
            endpoint,
            queue,
            max_instances,
            backoff,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(endpoint = %self.endpoint, "Mail queue listener started");

        while !shutdown.is_cancelled() {
            let mut channel = match ServerChannel::bind(&self.endpoint, self.max_instances) {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::error!(endpoint = %self.endpoint, error = %e, "Failed to open mail queue channel");
                    if !self.wait_backoff(&shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            let keep_running = self.serve(&mut channel, &shutdown).await;
            drop(channel);

            if !keep_running || !self.wait_backoff(&shutdown).await {
                break;
            }
        }

        tracing::info!(endpoint = %self.endpoint, "Mail queue listener stopped");
    }

    /// Serve connections on one channel until it fails or shutdown fires.
    /// Returns false on shutdown.
    async fn serve(&self, channel: &mut ServerChannel, shutdown: &CancellationToken) -> bool {
        loop {
            let stream = tokio::select! {
                _ = shutdown.cancelled() => return false,
                accepted = channel.accept() => accepted,
            };
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "Mail queue accept failed, recreating channel");
                    return true;
                }
            };

            let received = tokio::select! {
                _ = shutdown.cancelled() => return false,
                received = receive(stream) => received,
            };

            match received {
                Ok(Received::Message(message)) => {
                    tracing::debug!(
                        recipient = %message.email,
                        subject = %message.subject,
                        "Email received over pipe"
                    );
                    self.queue.push(message);
                }
                Ok(Received::Empty) => {
                    tracing::debug!("Mail queue connection closed without a message");
                }
                Ok(Received::Malformed(e)) => {
                    tracing::warn!(error = %e, "Discarding malformed mail queue message");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Mail queue receive failed, recreating channel");
                    return true;
                }
            }
        }
    }

    /// Sleep for the backoff. Returns false if shutdown fired first.
    async fn wait_backoff(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.backoff) => true,
        }
    }
}

/// Read one newline-terminated message and close the connection.
async fn receive<S>(stream: S) -> std::io::Result<Received>
where
    S: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream.take(MAX_MESSAGE_BYTES));
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(_) => {}
        // Non-UTF-8 payloads are a bad message, not a broken channel.
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Ok(Received::Malformed(serde_json::Error::io(e)));
        }
        Err(e) => return Err(e),
    }

    let line = line.trim();
    if line.is_empty() {
        return Ok(Received::Empty);
    }

    Ok(match serde_json::from_str(line) {
        Ok(message) => Received::Message(message),
        Err(e) => Received::Malformed(e),
    })
}
