//! Test helpers: in-memory storage fake and pipeline setup.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::{StorageBackend, UploadConfig};
use inkwell_storage::{Storage, StorageError, StorageResult};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Semaphore;

pub const CDN: &str = "https://cdn.test";

/// Category whose uploads fail at the backend.
pub const BROKEN_CATEGORY: &str = "broken";

/// Category whose uploads panic inside the backend call.
pub const PANIC_CATEGORY: &str = "explode";

/// Storage fake that keeps objects in memory and records call order.
#[derive(Default)]
pub struct RecordingStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads block until a permit is added to `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Filenames in the order upload calls started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload_stream(
        &self,
        category: &str,
        filename: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<(String, String)> {
        self.calls.lock().unwrap().push(filename.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if category == PANIC_CATEGORY {
            panic!("storage backend exploded");
        }
        if category == BROKEN_CATEGORY {
            return Err(StorageError::UploadFailed("bucket unreachable".to_string()));
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let key = format!("images/{}/{}", category, filename);
        self.objects.lock().unwrap().insert(key.clone(), data);
        Ok((key.clone(), format!("{}/{}", CDN, key)))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(storage_key);
        self.deleted.lock().unwrap().push(storage_key.to_string());
        Ok(())
    }

    fn key_from_url(&self, url: &str) -> StorageResult<String> {
        inkwell_storage::keys::key_from_public_url(CDN, url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub fn upload_config(temp_dir: &Path) -> UploadConfig {
    UploadConfig {
        max_file_size_bytes: 10 * 1024 * 1024,
        allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp"]
            .into_iter()
            .map(String::from)
            .collect(),
        allowed_content_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
            .into_iter()
            .map(String::from)
            .collect(),
        temp_dir: temp_dir.to_path_buf(),
    }
}

/// Bytes with a JPEG signature, padded to `len`.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len.max(4), 0x42);
    data
}

pub fn temp_dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
