/// Client for the hosted auth API
///
/// Mirrors what a browser client of the auth API does: it keeps the current
/// session in memory and broadcasts a change whenever it signs in or out.
///
/// # Endpoints
///
/// - `POST /auth/v1/signup?redirect_to=...` - create an account
/// - `POST /auth/v1/token?grant_type=password` - sign in
/// - `POST /auth/v1/logout` - revoke the current session

use super::{check, HostedConfig, SessionSlot};
use crate::backend::{
    BackendResult, IdentityService, Identity, Session, SessionChange, SESSION_FEED_CAPACITY,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Token grant returned by sign-in, and by signup when no confirmation is required
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenGrant {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Signup answers with a grant when the account is usable right away, and
/// with the bare user while email confirmation is pending
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpReply {
    Grant(TokenGrant),
    User(Identity),
    Unknown(JsonValue),
}

/// Hosted identity service client
pub struct HostedIdentity {
    http: reqwest::Client,
    config: Arc<HostedConfig>,
    session: SessionSlot,
    changes: broadcast::Sender<SessionChange>,
}

impl HostedIdentity {
    /// Creates an anonymous client
    pub fn new(http: reqwest::Client, config: Arc<HostedConfig>) -> Self {
        Self::with_session(http, config, None)
    }

    /// Creates a client that starts out with `session`
    pub fn with_session(
        http: reqwest::Client,
        config: Arc<HostedConfig>,
        session: Option<Session>,
    ) -> Self {
        Self::sharing(http, config, Arc::new(RwLock::new(session)))
    }

    /// Creates a client that keeps its session in `slot`
    ///
    /// A [`HostedTables`](super::HostedTables) built on the same slot sends
    /// whatever access token this client currently holds.
    pub fn sharing(http: reqwest::Client, config: Arc<HostedConfig>, slot: SessionSlot) -> Self {
        let (changes, _) = broadcast::channel(SESSION_FEED_CAPACITY);

        Self {
            http,
            config,
            session: slot,
            changes,
        }
    }

    fn announce(&self, change: SessionChange) {
        // No subscribers is fine; the state is still kept
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl IdentityService for HostedIdentity {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
        metadata: JsonValue,
    ) -> BackendResult<Option<Identity>> {
        let response = self
            .http
            .post(self.config.auth_url("signup"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;

        let reply: SignUpReply = check(response).await?.json().await?;

        match reply {
            SignUpReply::Grant(grant) => {
                let session = grant.into_session();
                let identity = session.user.clone();
                info!(user_id = %identity.id, "Account created and signed in");

                *self.session.write().await = Some(session.clone());
                self.announce(SessionChange::signed_in(session));
                Ok(Some(identity))
            }
            SignUpReply::User(identity) => {
                info!(user_id = %identity.id, "Account created, confirmation pending");
                Ok(Some(identity))
            }
            SignUpReply::Unknown(body) => {
                warn!(?body, "Signup accepted without a user in the reply");
                Ok(None)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session> {
        let response = self
            .http
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let grant: TokenGrant = check(response).await?.json().await?;
        let session = grant.into_session();
        debug!(user_id = %session.user.id, "Signed in");

        *self.session.write().await = Some(session.clone());
        self.announce(SessionChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let previous = self.session.write().await.take();

        if let Some(session) = previous {
            let response = self
                .http
                .post(self.config.auth_url("logout"))
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            // The local session is gone either way; a failed revoke only
            // leaves the token valid until it expires.
            match response {
                Ok(response) => {
                    if let Err(e) = check(response).await {
                        warn!(error = %e, "Auth API refused to revoke session");
                    }
                }
                Err(e) => warn!(error = %e, "Could not reach auth API to revoke session"),
            }
        }

        self.announce(SessionChange::signed_out());
        Ok(())
    }

    async fn current_session(&self) -> BackendResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    fn session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
