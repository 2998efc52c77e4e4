use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use inkwell_core::{models::Article, AppError};
use sqlx::{PgPool, Postgres};

/// Persistent article record store consumed by the upload completion.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError>;

    async fn save(&self, article: &Article) -> Result<(), AppError>;
}

/// Repository for article records in Postgres
#[derive(Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        let article = sqlx::query_as::<Postgres, Article>(
            "SELECT id, title, image_url, updated_at FROM articles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    #[tracing::instrument(skip(self, article), fields(db.table = "articles", db.operation = "update", db.record_id = %article.id))]
    async fn save(&self, article: &Article) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = $2, image_url = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.image_url)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Article {}", article.id)));
        }

        Ok(())
    }
}

/// Article store held in process memory.
#[derive(Default)]
pub struct InMemoryArticleStore {
    articles: Mutex<HashMap<i64, Article>>,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        Self {
            articles: Mutex::new(articles.into_iter().map(|a| (a.id, a)).collect()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, Article>>, AppError> {
        self.articles
            .lock()
            .map_err(|_| AppError::Internal("article store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn save(&self, article: &Article) -> Result<(), AppError> {
        self.lock()?.insert(article.id, article.clone());
        Ok(())
    }
}
