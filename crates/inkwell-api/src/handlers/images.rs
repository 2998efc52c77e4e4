use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use inkwell_core::AppError;
use serde::{Deserialize, Serialize};

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;

const FEATURED_CATEGORY: &str = "featured";
const INLINE_CATEGORY: &str = "inline";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ArticleImageQuery {
    #[serde(default)]
    featured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub url: String,
}

/// Upload a standalone image and return its public URL once stored.
#[tracing::instrument(skip(state, multipart), fields(category = %query.category))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), HttpAppError> {
    let (data, filename, content_type) = extract_multipart_file(multipart).await?;

    let url = state
        .uploads
        .submit(data, &filename, &content_type, &query.category, false, None)
        .await?;

    Ok((StatusCode::CREATED, Json(ImageUploadResponse { url })))
}

/// Upload an image for an article.
///
/// A featured image becomes the article's image once stored; inline images
/// only return their URL for the editor to embed.
#[tracing::instrument(skip(state, multipart), fields(featured = query.featured))]
pub async fn upload_article_image(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i64>,
    Query(query): Query<ArticleImageQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), HttpAppError> {
    if state.articles.find_by_id(article_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Article {}", article_id)).into());
    }

    let (data, filename, content_type) = extract_multipart_file(multipart).await?;
    let category = if query.featured {
        FEATURED_CATEGORY
    } else {
        INLINE_CATEGORY
    };

    let url = state
        .uploads
        .submit(
            data,
            &filename,
            &content_type,
            category,
            query.featured,
            Some(article_id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ImageUploadResponse { url })))
}
