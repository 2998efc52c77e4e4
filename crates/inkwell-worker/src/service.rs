use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkwell_core::validation::sanitize_filename;
use inkwell_core::{ImageValidator, UploadConfig};
use inkwell_storage::Storage;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::completion::ArticleImageCompletionHandler;
use crate::error::UploadError;
use crate::job::UploadJob;
use crate::queue::{upload_queue, UploadQueue};
use crate::registry::PendingUploads;
use crate::worker::ImageWorker;

/// A running image pipeline: the submit handle plus the worker task.
pub struct ImagePipeline {
    pub service: ImageUploadService,
    pub worker: JoinHandle<()>,
}

impl ImagePipeline {
    /// Spawn the image worker and return a handle for submitting uploads.
    ///
    /// The worker runs until `shutdown` is cancelled.
    pub fn start(
        storage: Arc<dyn Storage>,
        completion: Arc<dyn ArticleImageCompletionHandler>,
        config: &UploadConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (queue, receiver) = upload_queue();
        let pending = Arc::new(PendingUploads::new());

        let worker = ImageWorker::new(receiver, pending.clone(), storage, completion);
        let worker = tokio::spawn(worker.run(shutdown));

        let service = ImageUploadService {
            validator: ImageValidator::from_config(config),
            temp_dir: config.temp_dir.clone(),
            queue,
            pending,
        };

        Self { service, worker }
    }
}

/// Submit side of the pipeline. Cheap to clone.
#[derive(Clone)]
pub struct ImageUploadService {
    validator: ImageValidator,
    temp_dir: PathBuf,
    queue: UploadQueue,
    pending: Arc<PendingUploads>,
}

impl ImageUploadService {
    /// Upload an image through the worker and wait for its public URL.
    ///
    /// Validation and temp file failures are returned before anything is
    /// queued. After that the call waits, without a timeout, until the worker
    /// reports the job's outcome.
    #[tracing::instrument(skip(self, data, content_type), fields(size_bytes = data.len()))]
    pub async fn submit(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
        category: &str,
        is_featured: bool,
        article_id: Option<i64>,
    ) -> Result<String, UploadError> {
        let original_name = sanitize_filename(filename)?;
        let extension = self
            .validator
            .validate_all(&original_name, content_type, data.len())
            .map_err(|e| {
                tracing::warn!(error = %e, "Image rejected");
                e
            })?;

        // Slot exists before the job can possibly be picked up.
        let (job_id, waiter) = loop {
            let id = Uuid::new_v4();
            if let Some(waiter) = self.pending.register(id) {
                break (id, waiter);
            }
        };
        // Dropping the future before the job is queued must not strand the slot.
        let slot = PendingSlot::new(&self.pending, job_id);

        let staged = match write_temp_file(&self.temp_dir, job_id, &extension, &data).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to stage upload");
                return Err(UploadError::TempFile(e));
            }
        };
        // No await between here and the enqueue, so the kept file cannot be orphaned.
        let temp_path = staged.keep().map_err(|e| UploadError::TempFile(e.error))?;

        let job = UploadJob::new(
            job_id,
            temp_path,
            category,
            &extension,
            is_featured,
            article_id,
        );

        if let Err(job) = self.queue.enqueue(job) {
            let _ = std::fs::remove_file(&job.temp_path);
            tracing::error!(job_id = %job_id, "Image worker is not running");
            return Err(UploadError::WorkerStopped);
        }
        // The worker owns the slot and the temp file from here on.
        slot.disarm();

        tracing::debug!(
            job_id = %job_id,
            original_name = %original_name,
            queued = self.queue.len(),
            "Image upload queued"
        );

        waiter.await.map_err(|_| UploadError::WorkerStopped)?
    }

    /// Jobs waiting for the worker.
    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Submissions whose result slot has not been fulfilled and removed yet.
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    pub fn is_running(&self) -> bool {
        !self.queue.is_closed()
    }
}

/// Removes a registered result slot unless the submission reached the queue.
struct PendingSlot<'a> {
    pending: &'a PendingUploads,
    job_id: Uuid,
    armed: bool,
}

impl<'a> PendingSlot<'a> {
    fn new(pending: &'a PendingUploads, job_id: Uuid) -> Self {
        Self {
            pending,
            job_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pending.discard(self.job_id);
            tracing::debug!(job_id = %self.job_id, "Upload abandoned before queueing");
        }
    }
}

/// Copy the upload into a private temp file the worker will own.
///
/// The file is deleted when the returned path is dropped, so a submission
/// cancelled mid-write leaves nothing behind. Call `keep` to hand it off.
async fn write_temp_file(
    dir: &Path,
    job_id: Uuid,
    extension: &str,
    data: &[u8],
) -> std::io::Result<TempPath> {
    let (file, path) = tempfile::Builder::new()
        .prefix(&format!("inkwell-upload-{}-", job_id))
        .suffix(&format!(".{}", extension))
        .tempfile_in(dir)?
        .into_parts();

    // Write through the open handle; a path-based write could recreate the
    // file after the path guard has removed it.
    let mut file = tokio::fs::File::from_std(file);
    file.write_all(data).await?;
    file.flush().await?;

    Ok(path)
}
