//! Image upload pipeline.
//!
//! Callers hand a file to [`ImageUploadService::submit`] and await its public
//! URL. The file is parked in a temp file, a job goes onto an unbounded FIFO,
//! and a single [`ImageWorker`] uploads jobs one at a time, writes the result
//! back to the owning article and wakes the waiting caller through the
//! [`PendingUploads`] registry.

pub mod completion;
pub mod error;
pub mod job;
pub mod queue;
pub mod registry;
pub mod service;
pub mod worker;

pub use completion::{ArticleImageCompletionHandler, ArticleImageUpdater};
pub use error::UploadError;
pub use job::UploadJob;
pub use queue::{upload_queue, UploadQueue, UploadReceiver};
pub use registry::PendingUploads;
pub use service::{ImagePipeline, ImageUploadService};
pub use worker::ImageWorker;
