//! Inkwell Core Library
//!
//! Domain models, error types, configuration, and upload validation shared by
//! every Inkwell component (storage, image worker, mail queue, binaries).

pub mod config;
pub mod error;
pub mod models;
pub mod shutdown;
pub mod storage_types;
pub mod telemetry;
pub mod validation;

// Re-export commonly used types
pub use config::{
    BaseConfig, Config, LogFormat, MailQueueConfig, MailQueueRole, SmtpConfig, StorageConfig,
    UploadConfig,
};
pub use error::AppError;
pub use shutdown::shutdown_signal;
pub use storage_types::StorageBackend;
pub use validation::{ImageValidator, ValidationError};
