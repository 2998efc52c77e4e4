use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent article record, as far as the image pipeline is concerned.
///
/// Only the fields the upload completion touches are modelled; the rest of the
/// blog schema is owned elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: None,
            updated_at: Utc::now(),
        }
    }

    /// Point the article at a new image. Returns the URL it replaces, if any
    /// and if different.
    pub fn replace_image(&mut self, url: &str) -> Option<String> {
        let previous = self.image_url.replace(url.to_string());
        self.updated_at = Utc::now();
        previous.filter(|p| p != url)
    }
}
