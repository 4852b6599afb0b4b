/// Client for the hosted table API
///
/// Rows are read with `GET /rest/v1/{table}` using the API's query-string
/// filters (`column=eq.value`, `order=column.desc`) and written with
/// `POST /rest/v1/{table}` asking for the inserted row back.

use super::{check, HostedConfig, SessionSlot};
use crate::{
    backend::{BackendError, BackendResult, TableStore},
    models::{
        news::News,
        player_stats::PlayerStats,
        profile::{NewProfile, Profile},
        team::{NewTeam, Team},
    },
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt, sync::Arc};
use tracing::debug;
use uuid::Uuid;

/// Row selection against one table
///
/// # Example
///
/// ```
/// use passabola_shared::backend::hosted::Select;
///
/// let query = Select::from("news").order_desc("published_at");
/// assert_eq!(
///     query.query_pairs(),
///     vec![
///         ("select".to_string(), "*".to_string()),
///         ("order".to_string(), "published_at.desc".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: &'static str,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
        }
    }

    /// Keeps rows whose `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Orders by `column`, largest first
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.desc", column));
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Query-string pairs for the request
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        pairs
    }
}

/// Hosted table store client
///
/// Requests carry the access token of the session in its slot, so rows are
/// read and written as whoever is signed in at the time of the call.
pub struct HostedTables {
    http: reqwest::Client,
    config: Arc<HostedConfig>,
    session: SessionSlot,
}

impl HostedTables {
    /// Creates a client; while the slot is empty requests run as the anonymous role
    pub fn new(http: reqwest::Client, config: Arc<HostedConfig>, session: SessionSlot) -> Self {
        Self {
            http,
            config,
            session,
        }
    }

    async fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.anon_key.clone(),
        };

        self.http
            .request(method, self.config.rest_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Runs a selection and returns every matching row
    pub async fn select<T: DeserializeOwned>(&self, query: &Select) -> BackendResult<Vec<T>> {
        debug!(table = query.table(), "Selecting rows");

        let response = self
            .request(Method::GET, query.table())
            .await
            .query(&query.query_pairs())
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Runs a selection that may match at most one row
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        query: &Select,
    ) -> BackendResult<Option<T>> {
        let mut rows: Vec<T> = self.select(query).await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(BackendError::Decode(format!(
                "expected at most one row from {}, got {}",
                query.table(),
                n
            ))),
        }
    }

    /// Inserts a row and returns it as stored
    pub async fn insert<B, T>(&self, table: &'static str, row: &B) -> BackendResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(table, "Inserting row");

        let response = self
            .request(Method::POST, table)
            .await
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let mut rows: Vec<T> = check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(BackendError::Decode(format!(
                "insert into {} returned no row",
                table
            )));
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl TableStore for HostedTables {
    async fn insert_profile(&self, row: NewProfile) -> BackendResult<Profile> {
        self.insert("profiles", &row).await
    }

    async fn insert_team(&self, row: NewTeam) -> BackendResult<Team> {
        self.insert("teams", &row).await
    }

    async fn find_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        self.select_one(&Select::from("profiles").eq("id", id)).await
    }

    async fn find_player_stats(&self, player_id: Uuid) -> BackendResult<Option<PlayerStats>> {
        self.select_one(&Select::from("player_stats").eq("player_id", player_id))
            .await
    }

    async fn list_news(&self) -> BackendResult<Vec<News>> {
        self.select(&Select::from("news").order_desc("published_at"))
            .await
    }
}
