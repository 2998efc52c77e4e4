//! Article persistence for the image pipeline.
//!
//! The upload completion only needs two operations on article records, so the
//! store is a small trait. `PgArticleStore` is the production implementation;
//! `InMemoryArticleStore` backs development setups without a database and the
//! test suites.

pub mod article;
pub mod pool;

pub use article::{ArticleStore, InMemoryArticleStore, PgArticleStore};
pub use pool::setup_database;
