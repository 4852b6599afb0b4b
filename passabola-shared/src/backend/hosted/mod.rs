/// REST clients for the hosted backend
///
/// The hosted project exposes its auth API under `/auth/v1` and its table API
/// under `/rest/v1`. Every request carries the project's public `apikey`;
/// table requests additionally carry the caller's access token so row-level
/// policies see who is asking.
///
/// # Example
///
/// ```no_run
/// use passabola_shared::backend::hosted::{HostedConfig, HostedConnector};
/// use passabola_shared::backend::Connector;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = HostedConnector::new(HostedConfig {
///     url: "https://project.example.co".to_string(),
///     anon_key: "public-anon-key".to_string(),
///     jwt_secret: None,
/// })?;
///
/// let client = connector.connect(None).await?;
/// let news = client.tables.list_news().await?;
/// # Ok(())
/// # }
/// ```

pub mod identity;
pub mod tables;

pub use identity::HostedIdentity;
pub use tables::{HostedTables, Select};

use crate::{
    auth::jwt,
    backend::{
        postgres::PgTables, BackendError, BackendResult, Connector, Identity, Session, SiteClient,
        TableStore,
    },
};
use async_trait::async_trait;
use reqwest::{header, Response};
use serde::Deserialize;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::debug;

/// Session shared by the identity and table clients of one caller
pub type SessionSlot = Arc<RwLock<Option<Session>>>;

/// Connection settings for the hosted project
#[derive(Debug, Clone)]
pub struct HostedConfig {
    /// Project URL, without a trailing slash
    pub url: String,

    /// Public (anon) API key
    pub anon_key: String,

    /// Project JWT secret; when set, access tokens are verified locally
    /// instead of with a round trip to the auth API
    pub jwt_secret: Option<String>,
}

impl HostedConfig {
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url.trim_end_matches('/'), path)
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), table)
    }
}

/// Builds clients against the hosted project
pub struct HostedConnector {
    http: reqwest::Client,
    config: Arc<HostedConfig>,
    pool: Option<PgPool>,
}

impl HostedConnector {
    /// Creates a connector that uses the hosted table API
    pub fn new(config: HostedConfig) -> BackendResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("passabola/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            pool: None,
        })
    }

    /// Reads and writes tables directly through `pool` instead of the REST API
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    async fn restore_session(&self, token: &str) -> BackendResult<Option<Session>> {
        if let Some(secret) = &self.config.jwt_secret {
            return Ok(match jwt::validate_token(token, secret) {
                Ok(claims) => Some(Session {
                    access_token: token.to_string(),
                    refresh_token: None,
                    expires_at: Some(claims.exp),
                    user: Identity {
                        id: claims.sub,
                        email: claims.email,
                        user_metadata: claims.user_metadata,
                    },
                }),
                Err(e) => {
                    debug!(error = %e, "Ignoring unusable access token");
                    None
                }
            });
        }

        let response = self
            .http
            .get(self.config.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!(status = status.as_u16(), "Auth API rejected access token");
            return Ok(None);
        }

        let user: Identity = check(response).await?.json().await?;
        Ok(Some(Session {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
            user,
        }))
    }
}

#[async_trait]
impl Connector for HostedConnector {
    async fn connect(&self, access_token: Option<&str>) -> BackendResult<SiteClient> {
        let session = match access_token {
            Some(token) => self.restore_session(token).await?,
            None => None,
        };

        let slot: SessionSlot = Arc::new(RwLock::new(session));
        let tables: Arc<dyn TableStore> = match &self.pool {
            Some(pool) => Arc::new(PgTables::new(pool.clone())),
            None => Arc::new(HostedTables::new(
                self.http.clone(),
                Arc::clone(&self.config),
                Arc::clone(&slot),
            )),
        };

        Ok(SiteClient {
            identity: Arc::new(HostedIdentity::sharing(
                self.http.clone(),
                Arc::clone(&self.config),
                slot,
            )),
            tables,
        })
    }

    fn kind(&self) -> &'static str {
        if self.pool.is_some() {
            "hosted+postgres"
        } else {
            "hosted"
        }
    }
}

/// Error payloads of the auth and table APIs
///
/// The auth API answers with `msg`, `error_description` or `error`; the table
/// API with `message`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Passes successful responses through and turns the rest into rejections
pub(crate) async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);
    let text = response.text().await.unwrap_or_default();

    let message = is_json
        .then(|| serde_json::from_str::<ErrorBody>(&text).ok())
        .flatten()
        .and_then(|body| {
            body.msg
                .or(body.message)
                .or(body.error_description)
                .or(body.error)
        })
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let config = HostedConfig {
            url: "https://project.example.co/".to_string(),
            anon_key: "anon".to_string(),
            jwt_secret: None,
        };

        assert_eq!(config.auth_url("signup"), "https://project.example.co/auth/v1/signup");
        assert_eq!(config.rest_url("news"), "https://project.example.co/rest/v1/news");
    }
}
