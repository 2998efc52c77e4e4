//! Test helpers: recording email sender and polling utilities.
#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inkwell_mail::{EmailMessage, EmailSender, MailError};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Recipient whose deliveries fail at the SMTP layer.
pub const BOUNCING_RECIPIENT: &str = "bounce@example.com";

/// Recipient whose delivery panics inside the sender.
pub const PANICKING_RECIPIENT: &str = "panic@example.com";

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: Mutex<usize>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        *self.attempts.lock().unwrap() += 1;

        match message.email.as_str() {
            BOUNCING_RECIPIENT => Err(MailError::Smtp("550 mailbox unavailable".to_string())),
            PANICKING_RECIPIENT => panic!("smtp client bug"),
            _ => {
                self.sent.lock().unwrap().push(message.clone());
                Ok(())
            }
        }
    }
}

/// Channel name no other test uses.
pub fn unique_pipe_name() -> String {
    format!("inkwell-test-{}", uuid::Uuid::new_v4().simple())
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Log output collected by a thread-local subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of log lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}

/// Capture DEBUG and above on the current thread until the guard drops.
///
/// Only sees events emitted on this thread, so await the code under test
/// inline on a current-thread runtime.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
