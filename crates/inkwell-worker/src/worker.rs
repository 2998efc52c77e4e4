//! The single upload consumer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use inkwell_storage::Storage;
use tokio_util::sync::CancellationToken;

use crate::completion::ArticleImageCompletionHandler;
use crate::error::UploadError;
use crate::job::UploadJob;
use crate::queue::UploadReceiver;
use crate::registry::{PendingUploads, UploadResult};

/// Drains the upload queue one job at a time until cancelled.
pub struct ImageWorker {
    receiver: UploadReceiver,
    pending: Arc<PendingUploads>,
    storage: Arc<dyn Storage>,
    completion: Arc<dyn ArticleImageCompletionHandler>,
}

impl ImageWorker {
    pub fn new(
        receiver: UploadReceiver,
        pending: Arc<PendingUploads>,
        storage: Arc<dyn Storage>,
        completion: Arc<dyn ArticleImageCompletionHandler>,
    ) -> Self {
        Self {
            receiver,
            pending,
            storage,
            completion,
        }
    }

    /// Run until `shutdown` fires or every producer is dropped.
    ///
    /// Cancellation is only observed while waiting for the next job, so an
    /// upload in flight always completes. Jobs still queued at shutdown are
    /// failed with [`UploadError::WorkerStopped`].
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(backend = %self.storage.backend_type(), "Image worker started");

        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Image worker shutting down");
                    break;
                }
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            self.handle(job).await;
        }

        for job in self.receiver.close_and_drain() {
            remove_temp_file(&job.temp_path).await;
            self.pending.fulfill(job.id, Err(UploadError::WorkerStopped));
        }

        tracing::info!("Image worker stopped");
    }

    async fn handle(&self, job: UploadJob) {
        let start = Instant::now();

        let result = match AssertUnwindSafe(self.process(&job)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(job_id = %job.id, panic = %message, "Upload job panicked");
                Err(UploadError::WorkerPanicked(message))
            }
        };

        match &result {
            Ok(url) => tracing::info!(
                job_id = %job.id,
                category = %job.category,
                url = %url,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Image upload completed"
            ),
            Err(e) => tracing::error!(
                job_id = %job.id,
                category = %job.category,
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Image upload failed"
            ),
        }

        // Temp file goes first so a woken submitter never sees it.
        remove_temp_file(&job.temp_path).await;
        self.pending.fulfill(job.id, result);
    }

    async fn process(&self, job: &UploadJob) -> UploadResult {
        let file = tokio::fs::File::open(&job.temp_path).await?;
        let size = file.metadata().await?.len();

        let (key, url) = self
            .storage
            .upload_stream(
                &job.category,
                &job.filename,
                &job.content_type,
                Some(size),
                Box::pin(file),
            )
            .await?;

        tracing::debug!(job_id = %job.id, key = %key, size_bytes = size, "Image stored");

        if let Some(article_id) = job.article_id {
            if let Err(e) = self
                .completion
                .on_image_uploaded(job.id, &url, article_id, job.is_featured)
                .await
            {
                tracing::warn!(
                    job_id = %job.id,
                    article_id = article_id,
                    error = %e,
                    "Upload completion failed; upload kept"
                );
            }
        }

        Ok(url)
    }
}

async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to delete temp file"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
