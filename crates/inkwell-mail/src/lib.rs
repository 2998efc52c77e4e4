//! Outgoing email plumbing.
//!
//! One process owns the email FIFO ([`LocalEmailQueue`]) and runs a
//! [`PipeListener`] so other processes can hand it messages through a
//! [`PipeClient`]. The [`DrainWorker`] empties the FIFO on a fixed cadence,
//! suppresses duplicates and delivers through an [`EmailSender`].

pub mod client;
pub mod dedup;
pub mod drain;
pub mod error;
pub mod listener;
pub mod queue;
pub mod sender;
pub mod transport;

pub use client::PipeClient;
pub use dedup::ProcessedEmails;
pub use drain::{CycleSummary, DrainWorker};
pub use error::MailError;
pub use inkwell_core::models::{DedupKey, EmailMessage};
pub use listener::PipeListener;
pub use queue::{email_queue_for_role, EmailQueue, LocalEmailQueue, OwningEmailQueue, PipeEmailQueue};
pub use sender::{EmailSender, SmtpEmailSender};
pub use transport::PipeEndpoint;
