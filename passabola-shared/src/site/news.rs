/// News listing
///
/// Shows every post in the order the table store returns for
/// `published_at` descending. Where undated posts land is up to the store.

use crate::{
    backend::{BackendResult, TableStore},
    models::news::News,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Text shown instead of an empty grid
pub const NO_NEWS: &str = "Nenhuma notícia disponível no momento. Fique ligado!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewsListing {
    Items { items: Vec<News> },
    Empty { message: String },
}

impl NewsListing {
    pub fn from_rows(rows: Vec<News>) -> Self {
        if rows.is_empty() {
            NewsListing::Empty {
                message: NO_NEWS.to_string(),
            }
        } else {
            NewsListing::Items { items: rows }
        }
    }
}

/// News page
pub struct NewsView {
    tables: Arc<dyn TableStore>,
}

impl NewsView {
    pub(crate) fn new(tables: Arc<dyn TableStore>) -> Self {
        Self { tables }
    }

    /// Reads the listing; a failed read is returned, not shown as "no news"
    pub async fn load(&self) -> BackendResult<NewsListing> {
        let rows = self.tables.list_news().await.map_err(|e| {
            warn!(error = %e, "Could not load news");
            e
        })?;

        Ok(NewsListing::from_rows(rows))
    }
}
