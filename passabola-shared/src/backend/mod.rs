/// Contracts with the hosted backend
///
/// The site owns no credentials and no tables. It talks to two collaborators:
///
/// - an [`IdentityService`] that creates accounts, signs users in and out, and
///   announces session changes
/// - a [`TableStore`] that reads and inserts rows in the site tables
///
/// A [`Connector`] builds a [`SiteClient`] (one of each) for a caller,
/// restoring the caller's session from an access token when one is presented.
///
/// # Implementations
///
/// - [`hosted`]: REST clients for the hosted auth and table APIs
/// - [`postgres`]: table store over a directly reachable Postgres database
/// - [`memory`]: in-process backend for development and tests
///
/// # Example
///
/// ```no_run
/// use passabola_shared::backend::{memory::MemoryBackend, Connector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new("dev-secret-key-at-least-32-bytes-long");
/// let client = backend.connect(None).await?;
///
/// let news = client.tables.list_news().await?;
/// println!("{} news posts", news.len());
/// # Ok(())
/// # }
/// ```

pub mod hosted;
pub mod memory;
pub mod postgres;

use crate::models::{
    news::News,
    player_stats::PlayerStats,
    profile::{NewProfile, Profile},
    team::{NewTeam, Team},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Error type for calls to the identity service or table store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The provider refused the request; `message` is its own wording
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The call needs a signed-in user
    #[error("Not signed in")]
    Unauthenticated,

    /// The provider could not be reached
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The provider answered with something we could not read
    #[error("Unexpected backend response: {0}")]
    Decode(String),

    /// Direct database access failed
    #[error("Database error: {0}")]
    Database(String),
}

/// Backend result type alias
pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Message shown to the user for this failure
    ///
    /// Provider rejections are passed through verbatim; infrastructure
    /// failures get a generic sentence and are logged by the caller.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected { message, .. } => message.clone(),
            BackendError::Unauthenticated => {
                "Você precisa estar logado para continuar".to_string()
            }
            BackendError::Transport(_) | BackendError::Decode(_) | BackendError::Database(_) => {
                "Serviço indisponível no momento. Tente novamente.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // Constraint violations are the provider's answer, not an outage
                let status = match db_err.code().as_deref() {
                    Some("23505") => 409,
                    Some(code) if code.starts_with("23") => 400,
                    _ => return BackendError::Database(db_err.to_string()),
                };
                BackendError::Rejected {
                    status,
                    message: db_err.message().to_string(),
                }
            }
            other => BackendError::Database(other.to_string()),
        }
    }
}

/// An account as known to the identity service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// User id; also the primary key of the user's profile row
    pub id: Uuid,

    #[serde(default)]
    pub email: Option<String>,

    /// Metadata supplied at signup
    #[serde(default)]
    pub user_metadata: JsonValue,
}

/// An authenticated identity's active login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Expiry as a Unix timestamp, when the provider reports one
    #[serde(default)]
    pub expires_at: Option<i64>,

    pub user: Identity,
}

/// Kind of session change announced by the identity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// `(event, session)` pair delivered on the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub event: SessionEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: SessionEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: SessionEvent::SignedOut,
            session: None,
        }
    }
}

/// Capacity of identity change feeds
pub(crate) const SESSION_FEED_CAPACITY: usize = 16;

/// Identity service contract
///
/// Implementations keep the caller's current session, so one instance
/// represents one signed-in (or anonymous) client.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an account
    ///
    /// `redirect_to` is where the confirmation email sends the user.
    /// `metadata` is stored with the account. Returns the new identity, or
    /// `None` when the provider accepted the request without revealing one.
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
        metadata: JsonValue,
    ) -> BackendResult<Option<Identity>>;

    /// Signs in with email and password and announces `SignedIn`
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Ends the current session and announces `SignedOut`
    async fn sign_out(&self) -> BackendResult<()>;

    /// Current session snapshot
    async fn current_session(&self) -> BackendResult<Option<Session>>;

    /// Subscribes to session changes
    ///
    /// Dropping the receiver unsubscribes.
    fn session_changes(&self) -> broadcast::Receiver<SessionChange>;
}

/// Table store contract
///
/// Covers exactly the reads and writes the site performs. `player_stats` and
/// `news` are read-only: there is deliberately no way to write them here.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn insert_profile(&self, row: NewProfile) -> BackendResult<Profile>;

    async fn insert_team(&self, row: NewTeam) -> BackendResult<Team>;

    /// Profile by id; at most one row
    async fn find_profile(&self, id: Uuid) -> BackendResult<Option<Profile>>;

    /// Statistics by player id; at most one row
    async fn find_player_stats(&self, player_id: Uuid) -> BackendResult<Option<PlayerStats>>;

    /// All news ordered by `published_at` descending
    async fn list_news(&self) -> BackendResult<Vec<News>>;
}

/// Identity service and table store for one caller
#[derive(Clone)]
pub struct SiteClient {
    pub identity: Arc<dyn IdentityService>,
    pub tables: Arc<dyn TableStore>,
}

/// Builds clients for callers
#[async_trait]
pub trait Connector: Send + Sync {
    /// Creates a client, restoring the session behind `access_token`
    ///
    /// An expired or unknown token yields an anonymous client rather than an
    /// error; only failures to reach the backend are errors.
    async fn connect(&self, access_token: Option<&str>) -> BackendResult<SiteClient>;

    /// Short name of the backend, for health reporting
    fn kind(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejection_message_is_passed_through() {
        let err = BackendError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_infrastructure_errors_get_generic_message() {
        let err = BackendError::Transport("connection refused".to_string());
        assert!(!err.user_message().contains("connection refused"));
    }

    #[test]
    fn test_session_events_use_provider_names() {
        assert_eq!(serde_json::to_value(SessionEvent::SignedIn).unwrap(), json!("SIGNED_IN"));
        assert_eq!(
            serde_json::to_value(SessionEvent::TokenRefreshed).unwrap(),
            json!("TOKEN_REFRESHED")
        );
    }

    #[test]
    fn test_identity_ignores_unknown_fields() {
        let identity: Identity = serde_json::from_value(json!({
            "id": "0b8f6a3e-1d2c-4e5f-8a9b-0c1d2e3f4a5b",
            "aud": "authenticated",
            "email": "jogadora@example.com",
            "confirmed_at": null
        }))
        .unwrap();

        assert_eq!(identity.email.as_deref(), Some("jogadora@example.com"));
        assert!(identity.user_metadata.is_null());
    }
}
