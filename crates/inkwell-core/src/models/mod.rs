//! Data models shared across the workspace

mod article;
mod email;

pub use article::*;
pub use email::*;
