use std::time::Duration;

use inkwell_core::models::EmailMessage;
use tokio::io::AsyncWriteExt;

use crate::error::MailError;
use crate::transport::{self, PipeEndpoint};

/// Sends email messages to the owning process over the named channel.
///
/// Delivery is best-effort: one retry after `retry_delay`, then the message is
/// dropped with a single error log line. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct PipeClient {
    endpoint: PipeEndpoint,
    connect_timeout: Duration,
    retry_delay: Duration,
}

impl PipeClient {
    pub fn new(endpoint: PipeEndpoint, connect_timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            endpoint,
            connect_timeout,
            retry_delay,
        }
    }

    pub fn endpoint(&self) -> &PipeEndpoint {
        &self.endpoint
    }

    /// Forward `message`, retrying exactly once on failure.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut payload = serde_json::to_vec(message)?;
        payload.push(b'\n');

        let first = match self.send_once(&payload).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        tracing::debug!(
            endpoint = %self.endpoint,
            error = %first,
            retry_in_ms = self.retry_delay.as_millis() as u64,
            "Mail queue send failed, retrying once"
        );

        tokio::time::sleep(self.retry_delay).await;

        self.send_once(&payload).await.map_err(|e| {
            tracing::error!(
                endpoint = %self.endpoint,
                recipient = %message.email,
                subject = %message.subject,
                error = %e,
                "Email dropped: mail queue owner unreachable after retry"
            );
            e
        })
    }

    async fn send_once(&self, payload: &[u8]) -> Result<(), MailError> {
        let mut stream = tokio::time::timeout(self.connect_timeout, transport::connect(&self.endpoint))
            .await
            .map_err(|_| MailError::Timeout(self.connect_timeout))?
            .map_err(MailError::Connect)?;

        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await?;
        Ok(())
    }
}
