use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use inkwell_core::models::DedupKey;

/// Keys of messages already delivered, kept for a retention window.
///
/// Owned by the drain worker; no internal locking.
#[derive(Debug)]
pub struct ProcessedEmails {
    retention: Duration,
    marked_at: HashMap<DedupKey, DateTime<Utc>>,
}

impl ProcessedEmails {
    pub fn new(retention: std::time::Duration) -> Self {
        Self {
            retention: Duration::from_std(retention).unwrap_or(Duration::MAX),
            marked_at: HashMap::new(),
        }
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.marked_at.contains_key(key)
    }

    /// Record `key` as delivered at `now`.
    pub fn mark(&mut self, key: DedupKey, now: DateTime<Utc>) {
        self.marked_at.insert(key, now);
    }

    /// Forget markers that are at least one retention window old at `now`.
    /// Returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.marked_at.len();
        if let Some(cutoff) = now.checked_sub_signed(self.retention) {
            self.marked_at.retain(|_, marked| *marked > cutoff);
        }
        before - self.marked_at.len()
    }

    pub fn len(&self) -> usize {
        self.marked_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked_at.is_empty()
    }
}
