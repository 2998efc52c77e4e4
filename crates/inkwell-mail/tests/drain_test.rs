//! Drain worker tests.
//!
//! Run with: `cargo test -p inkwell-mail --test drain_test`

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{wait_until, RecordingSender, BOUNCING_RECIPIENT, PANICKING_RECIPIENT};
use inkwell_mail::{CycleSummary, DrainWorker, EmailMessage, LocalEmailQueue};
use tokio_util::sync::CancellationToken;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn worker(
    queue: &Arc<LocalEmailQueue>,
    sender: &Arc<RecordingSender>,
    interval: Duration,
    retention: Duration,
) -> DrainWorker {
    DrainWorker::new(queue.clone(), sender.clone(), interval, retention)
}

#[tokio::test]
async fn test_duplicate_message_sent_once() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let mut drain = worker(&queue, &sender, Duration::from_secs(10), DAY);

    let message = EmailMessage::new("reader@example.com", "Your article got a reply", "<p>Hi</p>");
    queue.push(message.clone());
    queue.push(message.clone());

    let first = drain.run_cycle().await;
    assert_eq!(
        first,
        CycleSummary {
            processed: 1,
            failed: 0,
            skipped: 1,
            total: 2
        }
    );

    queue.push(message.clone());
    let second = drain.run_cycle().await;
    assert_eq!(second.skipped, 1);
    assert_eq!(second.processed, 0);

    assert_eq!(sender.sent(), vec![message]);
}

#[tokio::test]
async fn test_same_content_different_timestamp_is_not_duplicate() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let mut drain = worker(&queue, &sender, Duration::from_secs(10), DAY);

    let first = EmailMessage::new("reader@example.com", "Weekly digest", "<p>1</p>");
    let mut second = first.clone();
    second.created_at = first.created_at + chrono::Duration::seconds(1);
    queue.push(first);
    queue.push(second);

    let summary = drain.run_cycle().await;
    assert_eq!(summary.processed, 2);
    assert_eq!(sender.sent().len(), 2);
}

#[tokio::test]
async fn test_failed_send_is_counted_not_retried() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let mut drain = worker(&queue, &sender, Duration::from_secs(10), DAY);

    queue.push(EmailMessage::new(BOUNCING_RECIPIENT, "Welcome", "<p>Hi</p>"));
    queue.push(EmailMessage::new("ok@example.com", "Welcome", "<p>Hi</p>"));

    let summary = drain.run_cycle().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.total, 2);
    assert!(queue.is_empty());

    let next = drain.run_cycle().await;
    assert_eq!(next, CycleSummary::default());
    assert_eq!(sender.attempts(), 2);
    // Only delivered mail is marked.
    assert_eq!(drain.processed_markers(), 1);
}

#[tokio::test]
async fn test_expired_markers_purged_after_cycle() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let mut drain = worker(&queue, &sender, Duration::from_secs(10), Duration::ZERO);

    let message = EmailMessage::new("reader@example.com", "Reset password", "<p>link</p>");
    queue.push(message.clone());
    drain.run_cycle().await;
    assert_eq!(drain.processed_markers(), 0);

    // With the marker gone the same message is delivered again.
    queue.push(message);
    let summary = drain.run_cycle().await;
    assert_eq!(summary.processed, 1);
    assert_eq!(sender.sent().len(), 2);
}

#[tokio::test]
async fn test_run_survives_panicking_cycle() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let drain = worker(&queue, &sender, Duration::from_millis(20), DAY);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(drain.run(shutdown.clone()));

    queue.push(EmailMessage::new(PANICKING_RECIPIENT, "Boom", "<p>x</p>"));
    wait_until(|| sender.attempts() == 1 && queue.is_empty()).await;

    queue.push(EmailMessage::new("reader@example.com", "Still alive", "<p>y</p>"));
    wait_until(|| sender.sent().len() == 1).await;
    assert!(!handle.is_finished());

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_runs_final_cycle() {
    let queue = Arc::new(LocalEmailQueue::new());
    let sender = Arc::new(RecordingSender::new());
    let drain = worker(&queue, &sender, Duration::from_secs(3600), DAY);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(drain.run(shutdown.clone()));

    queue.push(EmailMessage::new("reader@example.com", "Goodbye", "<p>z</p>"));
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(sender.sent().len(), 1);
    assert!(queue.is_empty());
}
