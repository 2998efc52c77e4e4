//! Shared key generation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Category used when the submitter gives none (or nothing usable).
pub const DEFAULT_CATEGORY: &str = "general";

/// Normalize a destination category into a single safe path segment.
pub fn sanitize_category(category: &str) -> String {
    let cleaned: String = category
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if cleaned.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        cleaned
    }
}

/// Generate a storage key for the given category and filename.
pub fn generate_storage_key(category: &str, filename: &str) -> String {
    format!("images/{}/{}", sanitize_category(category), filename)
}

/// Map a public URL back to its key by stripping the backend's URL prefix.
pub fn key_from_public_url(base_url: &str, url: &str) -> StorageResult<String> {
    let prefix = format!("{}/", base_url.trim_end_matches('/'));
    url.strip_prefix(&prefix)
        .filter(|key| !key.is_empty() && !key.contains("..") && !key.starts_with('/'))
        .map(String::from)
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("URL is not served by this storage: {}", url))
        })
}
