use std::path::PathBuf;
use uuid::Uuid;

/// One file waiting to be moved from its temp location to object storage.
///
/// Owned by the queue and then the worker from enqueue until the upload
/// attempt finishes; the temp file is deleted afterwards either way.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub id: Uuid,
    pub temp_path: PathBuf,
    pub category: String,
    /// Object name inside the category, `{id}.{ext}`.
    pub filename: String,
    pub content_type: String,
    pub is_featured: bool,
    pub article_id: Option<i64>,
}

impl UploadJob {
    pub fn new(
        id: Uuid,
        temp_path: PathBuf,
        category: impl Into<String>,
        extension: &str,
        is_featured: bool,
        article_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            temp_path,
            category: category.into(),
            filename: format!("{}.{}", id, extension),
            content_type: inkwell_core::validation::content_type_for_extension(extension)
                .to_string(),
            is_featured,
            article_id,
        }
    }
}
