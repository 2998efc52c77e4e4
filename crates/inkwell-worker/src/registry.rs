//! Pending-upload registry.
//!
//! Maps a job id to the one-shot slot its submitter is waiting on. Submitters
//! only insert; the worker fulfills a slot and removes the entry afterwards.
//! An entry is never removed before its slot has been fulfilled.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::UploadError;

pub type UploadResult = Result<String, UploadError>;

type ResultSlot = oneshot::Sender<UploadResult>;

#[derive(Default)]
pub struct PendingUploads {
    // `None` marks a slot that has been taken for fulfillment but whose entry
    // has not been removed yet.
    slots: Mutex<HashMap<Uuid, Option<ResultSlot>>>,
}

impl PendingUploads {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Option<ResultSlot>>> {
        // Nothing here can panic while holding the lock, but a poisoned map is
        // still consistent.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create the result slot for `job_id` and return the waiting end.
    ///
    /// Returns `None` if the id is already registered.
    pub fn register(&self, job_id: Uuid) -> Option<oneshot::Receiver<UploadResult>> {
        let mut slots = self.slots();
        if slots.contains_key(&job_id) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(job_id, Some(tx));
        Some(rx)
    }

    /// Fulfill the slot for `job_id` with `result`, then drop the entry.
    ///
    /// Returns false if no unfulfilled slot exists for the job.
    pub fn fulfill(&self, job_id: Uuid, result: UploadResult) -> bool {
        let slot = self.slots().get_mut(&job_id).and_then(Option::take);

        let Some(slot) = slot else {
            tracing::error!(job_id = %job_id, "No pending upload registered for job");
            return false;
        };

        if slot.send(result).is_err() {
            tracing::debug!(job_id = %job_id, "Submitter stopped waiting before job completed");
        }

        self.slots().remove(&job_id);
        true
    }

    /// Drop a slot that was registered but never enqueued.
    pub fn discard(&self, job_id: Uuid) {
        self.slots().remove(&job_id);
    }

    pub fn contains(&self, job_id: &Uuid) -> bool {
        self.slots().contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fulfill_wakes_waiter_then_removes_entry() {
        let registry = PendingUploads::new();
        let id = Uuid::new_v4();

        let rx = registry.register(id).unwrap();
        assert!(registry.contains(&id));
        assert!(registry.register(id).is_none());

        assert!(registry.fulfill(id, Ok("https://cdn/x.png".to_string())));
        assert!(registry.is_empty());
        assert_eq!(rx.await.unwrap().unwrap(), "https://cdn/x.png");
    }

    #[test]
    fn fulfill_unknown_job_is_reported() {
        let registry = PendingUploads::new();
        assert!(!registry.fulfill(Uuid::new_v4(), Err(UploadError::WorkerStopped)));
    }

    #[test]
    fn fulfill_after_waiter_dropped_still_cleans_up() {
        let registry = PendingUploads::new();
        let id = Uuid::new_v4();
        drop(registry.register(id).unwrap());

        assert!(registry.fulfill(id, Err(UploadError::WorkerStopped)));
        assert!(!registry.contains(&id));
    }
}
