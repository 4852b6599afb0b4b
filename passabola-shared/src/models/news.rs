/// News posts
///
/// Authored out-of-band; the site lists them newest first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE news (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT NOT NULL,
///     content TEXT NOT NULL,
///     image_url TEXT,
///     author_id UUID REFERENCES profiles (id),
///     published_at TIMESTAMPTZ DEFAULT NOW(),
///     created_at TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// News row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl News {
    /// Lists all news, newest `published_at` first
    ///
    /// Rows without `published_at` come first, which is Postgres' default
    /// placement of NULLs in descending order.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let news = sqlx::query_as::<_, News>(
            r#"
            SELECT id, title, content, image_url, author_id, published_at, created_at
            FROM news
            ORDER BY published_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(news)
    }
}
