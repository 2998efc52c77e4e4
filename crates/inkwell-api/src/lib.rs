//! Inkwell API Library
//!
//! HTTP handlers and application setup. The binary in `main.rs` wires these
//! together; integration tests build the router directly.

mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
