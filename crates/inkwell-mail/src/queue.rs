//! Email queue roles.
//!
//! `enqueue` never fails from the caller's point of view. The owning process
//! pushes onto its in-process FIFO; every other process forwards over the
//! pipe and forgets about the message.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use inkwell_core::models::EmailMessage;
use inkwell_core::{MailQueueConfig, MailQueueRole};

use crate::client::PipeClient;
use crate::transport::PipeEndpoint;

/// Thread-safe FIFO of outgoing messages held by the owning process.
#[derive(Debug, Default)]
pub struct LocalEmailQueue {
    messages: Mutex<VecDeque<EmailMessage>>,
}

impl LocalEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<EmailMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, message: EmailMessage) {
        self.messages().push_back(message);
    }

    /// Take the oldest message, if any. Never waits.
    pub fn try_dequeue(&self) -> Option<EmailMessage> {
        self.messages().pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fire-and-forget entry point for code that wants to send mail.
pub trait EmailQueue: Send + Sync {
    fn enqueue_message(&self, message: EmailMessage);

    fn enqueue(&self, email: &str, subject: &str, html_message: &str) {
        self.enqueue_message(EmailMessage::new(email, subject, html_message));
    }
}

/// Queue role of the process that owns the FIFO.
#[derive(Clone)]
pub struct OwningEmailQueue {
    local: Arc<LocalEmailQueue>,
}

impl OwningEmailQueue {
    pub fn new(local: Arc<LocalEmailQueue>) -> Self {
        Self { local }
    }
}

impl EmailQueue for OwningEmailQueue {
    fn enqueue_message(&self, message: EmailMessage) {
        tracing::debug!(recipient = %message.email, subject = %message.subject, "Email queued");
        self.local.push(message);
    }
}

/// Queue role of a non-owning process: every message goes over the pipe.
///
/// Each enqueue spawns the send on the current Tokio runtime. Called outside
/// a runtime, the message is logged and dropped.
#[derive(Clone)]
pub struct PipeEmailQueue {
    client: Arc<PipeClient>,
}

impl PipeEmailQueue {
    pub fn new(client: Arc<PipeClient>) -> Self {
        Self { client }
    }
}

impl EmailQueue for PipeEmailQueue {
    fn enqueue_message(&self, message: EmailMessage) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!(
                    recipient = %message.email,
                    subject = %message.subject,
                    "Email dropped: no async runtime to forward it on"
                );
                return;
            }
        };

        let client = self.client.clone();
        handle.spawn(async move {
            // Failures are already logged by the client.
            let _ = client.send(&message).await;
        });
    }
}

/// Pick the queue implementation for this process's configured role.
pub fn email_queue_for_role(
    config: &MailQueueConfig,
    local: Arc<LocalEmailQueue>,
) -> Arc<dyn EmailQueue> {
    match config.role {
        MailQueueRole::Server => Arc::new(OwningEmailQueue::new(local)),
        MailQueueRole::Client => {
            let client = PipeClient::new(
                PipeEndpoint::new(&config.pipe_name),
                config.connect_timeout,
                config.retry_delay,
            );
            Arc::new(PipeEmailQueue::new(Arc::new(client)))
        }
    }
}
