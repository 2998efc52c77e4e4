//! Unbounded FIFO between submitters and the image worker.
//!
//! Enqueue never blocks. There is no capacity limit, so sustained overload
//! grows memory instead of pushing back on submitters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::job::UploadJob;

/// Create a connected queue / receiver pair.
pub fn upload_queue() -> (UploadQueue, UploadReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queued = Arc::new(AtomicUsize::new(0));
    (
        UploadQueue {
            tx,
            queued: queued.clone(),
        },
        UploadReceiver { rx, queued },
    )
}

/// Producer side, cloned into every submitter.
#[derive(Clone)]
pub struct UploadQueue {
    tx: mpsc::UnboundedSender<UploadJob>,
    queued: Arc<AtomicUsize>,
}

impl UploadQueue {
    /// Push a job. Fails only when the worker is gone, handing the job back.
    pub fn enqueue(&self, job: UploadJob) -> Result<(), UploadJob> {
        self.queued.fetch_add(1, Ordering::SeqCst);
        self.tx.send(job).map_err(|e| {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            e.0
        })
    }

    /// Jobs enqueued but not yet picked up by the worker.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the single worker.
pub struct UploadReceiver {
    rx: mpsc::UnboundedReceiver<UploadJob>,
    queued: Arc<AtomicUsize>,
}

impl UploadReceiver {
    pub async fn recv(&mut self) -> Option<UploadJob> {
        let job = self.rx.recv().await?;
        self.queued.fetch_sub(1, Ordering::SeqCst);
        Some(job)
    }

    /// Stop accepting new jobs and take whatever is still buffered.
    pub fn close_and_drain(&mut self) -> Vec<UploadJob> {
        self.rx.close();
        let mut remaining = Vec::new();
        while let Ok(job) = self.rx.try_recv() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            remaining.push(job);
        }
        remaining
    }
}
