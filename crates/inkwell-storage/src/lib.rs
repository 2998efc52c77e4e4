//! Inkwell Storage Library
//!
//! Object storage abstraction for uploaded images, with S3 and local
//! filesystem implementations.
//!
//! # Storage key format
//!
//! All backends use the same layout: `images/{category}/{filename}`, where
//! the category is the destination sub-path the submitter asked for
//! ("featured", "inline", ...). Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use inkwell_core::validation::content_type_for_extension;
pub use inkwell_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
