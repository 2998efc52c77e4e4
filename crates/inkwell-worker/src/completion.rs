use std::sync::Arc;

use async_trait::async_trait;
use inkwell_core::AppError;
use inkwell_db::ArticleStore;
use inkwell_storage::Storage;
use uuid::Uuid;

/// Applies a finished upload to persistent state.
///
/// Invoked by the worker after a successful upload for jobs that carry an
/// owning article id. Errors are logged by the worker and never undo the
/// upload.
#[async_trait]
pub trait ArticleImageCompletionHandler: Send + Sync {
    async fn on_image_uploaded(
        &self,
        job_id: Uuid,
        url: &str,
        article_id: i64,
        is_featured: bool,
    ) -> Result<(), AppError>;
}

/// Writes featured image URLs into article records.
///
/// Inline (non-featured) images are embedded by the editor and leave the
/// record alone. When a featured image replaces a different one, the old
/// object is deleted best-effort.
pub struct ArticleImageUpdater {
    articles: Arc<dyn ArticleStore>,
    storage: Arc<dyn Storage>,
}

impl ArticleImageUpdater {
    pub fn new(articles: Arc<dyn ArticleStore>, storage: Arc<dyn Storage>) -> Self {
        Self { articles, storage }
    }
}

#[async_trait]
impl ArticleImageCompletionHandler for ArticleImageUpdater {
    #[tracing::instrument(skip(self, url))]
    async fn on_image_uploaded(
        &self,
        job_id: Uuid,
        url: &str,
        article_id: i64,
        is_featured: bool,
    ) -> Result<(), AppError> {
        if !is_featured {
            tracing::debug!("Inline image uploaded, article record unchanged");
            return Ok(());
        }

        let mut article = self
            .articles
            .find_by_id(article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {}", article_id)))?;

        let replaced = article.replace_image(url);
        self.articles.save(&article).await?;

        tracing::info!(url = %url, "Article image updated");

        if let Some(previous) = replaced {
            if let Err(e) = self.storage.delete_by_url(&previous).await {
                tracing::warn!(
                    error = %e,
                    previous_url = %previous,
                    "Failed to delete replaced article image"
                );
            }
        }

        Ok(())
    }
}
