use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dedup::ProcessedEmails;
use crate::queue::LocalEmailQueue;
use crate::sender::EmailSender;

/// Outcome counts of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub processed: usize,
    pub failed: usize,
    /// Duplicates of messages already delivered within the retention window.
    pub skipped: usize,
    pub total: usize,
}

/// Periodically empties the email queue and delivers each message once.
pub struct DrainWorker {
    queue: Arc<LocalEmailQueue>,
    sender: Arc<dyn EmailSender>,
    processed: ProcessedEmails,
    interval: Duration,
}

impl DrainWorker {
    pub fn new(
        queue: Arc<LocalEmailQueue>,
        sender: Arc<dyn EmailSender>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            queue,
            sender,
            processed: ProcessedEmails::new(retention),
            interval,
        }
    }

    /// Sleep, drain, repeat until `shutdown` fires.
    ///
    /// A cycle that fails (including by panicking) is logged and the next one
    /// runs on schedule. One last cycle runs on shutdown so queued mail is not
    /// lost with the process.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Email drain worker started"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.guarded_cycle().await;
        }

        tracing::info!("Email drain worker shutting down, running final cycle");
        self.guarded_cycle().await;
        tracing::info!("Email drain worker stopped");
    }

    async fn guarded_cycle(&mut self) {
        if let Err(panic) = AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(panic = %message, "Email drain cycle failed");
        }
    }

    /// Drain the messages present at cycle start, deliver each unseen one,
    /// then purge expired dedup markers.
    pub async fn run_cycle(&mut self) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let pending = self.queue.len();

        for _ in 0..pending {
            let Some(message) = self.queue.try_dequeue() else {
                break;
            };
            summary.total += 1;

            let key = message.dedup_key();
            if self.processed.contains(&key) {
                tracing::debug!(dedup_key = %key, "Skipping already delivered email");
                summary.skipped += 1;
                continue;
            }

            match self.sender.send(&message).await {
                Ok(()) => {
                    self.processed.mark(key, Utc::now());
                    summary.processed += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        recipient = %message.email,
                        subject = %message.subject,
                        error = %e,
                        "Failed to send email"
                    );
                }
            }
        }

        let purged = self.processed.purge_expired(Utc::now());

        if summary.total > 0 || purged > 0 {
            tracing::info!(
                processed = summary.processed,
                failed = summary.failed,
                skipped = summary.skipped,
                total = summary.total,
                purged,
                "Email drain cycle completed"
            );
        } else {
            tracing::debug!("Email drain cycle found nothing to send");
        }

        summary
    }

    pub fn processed_markers(&self) -> usize {
        self.processed.len()
    }
}
