use inkwell_core::{AppError, ValidationError};
use inkwell_storage::StorageError;
use thiserror::Error;

/// Failure observed by an upload submitter.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to write temp file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Upload worker stopped before the job completed")]
    WorkerStopped,
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(e) => e.into(),
            UploadError::Storage(e) => AppError::Storage(e.to_string()),
            UploadError::TempFile(e) | UploadError::Io(e) => AppError::InternalWithSource {
                message: "Failed to stage upload".to_string(),
                source: e.into(),
            },
            other => AppError::Internal(other.to_string()),
        }
    }
}
