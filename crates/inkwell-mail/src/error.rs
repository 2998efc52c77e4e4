use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to connect to mail queue channel: {0}")]
    Connect(#[source] std::io::Error),

    #[error("Timed out after {0:?} connecting to mail queue channel")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize email message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),
}
