//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Remote object store client.
///
/// Uploads return `(storage_key, public_url)`. The key is internal; the URL is
/// what ends up in article records and can later be handed back to
/// [`Storage::delete_by_url`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file from a reader, consumed until EOF, under
    /// `images/{category}/{filename}`.
    async fn upload_stream(
        &self,
        category: &str,
        filename: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<(String, String)>;

    /// Delete a file by its storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Resolve a public URL produced by this backend back to its key.
    fn key_from_url(&self, url: &str) -> StorageResult<String>;

    /// Delete the object behind a public URL.
    async fn delete_by_url(&self, url: &str) -> StorageResult<()> {
        let key = self.key_from_url(url)?;
        self.delete(&key).await
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
