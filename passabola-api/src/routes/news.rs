/// News endpoint
///
/// ```text
/// GET /v1/news
/// ```
///
/// ```json
/// { "kind": "items", "items": [ { "title": "...", "published_at": "..." } ] }
/// { "kind": "empty", "message": "Nenhuma notícia disponível no momento. Fique ligado!" }
/// ```

use crate::error::ApiResult;
use axum::{Extension, Json};
use passabola_shared::site::{news::NewsListing, Site};
use std::sync::Arc;

pub async fn list_news(Extension(site): Extension<Arc<Site>>) -> ApiResult<Json<NewsListing>> {
    let listing = site.news_view().load().await?;
    Ok(Json(listing))
}
