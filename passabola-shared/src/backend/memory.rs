/// In-process backend for development and tests
///
/// Keeps accounts and rows in memory and behaves like the hosted project
/// where the site can observe it: signup does not sign in, wrong credentials
/// and duplicate keys are rejected with the provider's wording, and news
/// come back newest first with undated posts ahead of the rest.
///
/// Every call made through the contracts is appended to a call log, so tests
/// can assert which remote operations a page issued and in what order.
///
/// # Example
///
/// ```no_run
/// use passabola_shared::backend::memory::{MemoryBackend, Operation};
/// use passabola_shared::backend::Connector;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new("dev-secret-key-at-least-32-bytes-long");
/// let client = backend.connect(None).await?;
///
/// client.tables.list_news().await?;
/// assert_eq!(backend.count(Operation::ListNews).await, 1);
/// # Ok(())
/// # }
/// ```

use crate::{
    auth::{jwt, password},
    backend::{
        BackendError, BackendResult, Connector, Identity, IdentityService, Session,
        SessionChange, SiteClient, TableStore, SESSION_FEED_CAPACITY,
    },
    models::{
        news::News,
        player_stats::PlayerStats,
        profile::{NewProfile, Profile},
        team::{NewTeam, Team},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Remote operation recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateIdentity,
    Authenticate,
    SignOut,
    CurrentSession,
    InsertProfile,
    InsertTeam,
    FindProfile,
    FindPlayerStats,
    ListNews,
}

/// One entry of the call log
///
/// Passwords are never recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub payload: JsonValue,
}

struct Account {
    identity: Identity,
    password_hash: String,
}

#[derive(Default)]
struct MemoryStore {
    accounts: HashMap<String, Account>,
    profiles: HashMap<Uuid, Profile>,
    teams: Vec<Team>,
    player_stats: Vec<PlayerStats>,
    news: Vec<News>,
    calls: Vec<Call>,
    failures: HashMap<Operation, BackendError>,
}

impl MemoryStore {
    /// Logs a call and fails it if a failure was queued for the operation
    fn record(&mut self, operation: Operation, payload: JsonValue) -> BackendResult<()> {
        self.calls.push(Call { operation, payload });

        match self.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn account_by_id(&self, id: Uuid) -> Option<&Account> {
        self.accounts.values().find(|a| a.identity.id == id)
    }
}

fn internal(err: impl std::fmt::Display) -> BackendError {
    BackendError::Database(err.to_string())
}

/// In-memory backend
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
    jwt_secret: Arc<str>,
}

impl MemoryBackend {
    /// Creates an empty backend that signs access tokens with `jwt_secret`
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            store: Arc::new(Mutex::new(MemoryStore::default())),
            jwt_secret: Arc::from(jwt_secret.into()),
        }
    }

    /// Anonymous identity service client
    pub fn identity(&self) -> MemoryIdentity {
        MemoryIdentity::new(self.clone(), None)
    }

    pub fn tables(&self) -> MemoryTables {
        MemoryTables {
            store: Arc::clone(&self.store),
        }
    }

    /// Anonymous site client
    pub fn client(&self) -> SiteClient {
        SiteClient {
            identity: Arc::new(self.identity()),
            tables: Arc::new(self.tables()),
        }
    }

    /// Snapshot of the call log
    pub async fn calls(&self) -> Vec<Call> {
        self.store.lock().await.calls.clone()
    }

    /// Number of logged calls of one operation
    pub async fn count(&self, operation: Operation) -> usize {
        self.store
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Makes the next call of `operation` fail with `err`
    pub async fn fail_next(&self, operation: Operation, err: BackendError) {
        self.store.lock().await.failures.insert(operation, err);
    }

    /// Creates an account directly, bypassing the call log
    pub async fn add_user(
        &self,
        email: &str,
        password: &str,
        user_metadata: JsonValue,
    ) -> BackendResult<Identity> {
        let password_hash = password::hash_password(password).map_err(internal)?;
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata,
        };

        self.store.lock().await.accounts.insert(
            email.to_string(),
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    pub async fn seed_profile(&self, profile: Profile) {
        self.store.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn seed_player_stats(&self, stats: PlayerStats) {
        self.store.lock().await.player_stats.push(stats);
    }

    pub async fn seed_news(&self, news: News) {
        self.store.lock().await.news.push(news);
    }

    /// Stored profile, bypassing the call log
    pub async fn profile(&self, id: Uuid) -> Option<Profile> {
        self.store.lock().await.profiles.get(&id).cloned()
    }

    /// Stored teams in insertion order, bypassing the call log
    pub async fn teams(&self) -> Vec<Team> {
        self.store.lock().await.teams.clone()
    }

    /// Issues an access token for an existing account
    fn issue_session(&self, identity: &Identity) -> BackendResult<Session> {
        let claims = jwt::Claims::new(
            identity.id,
            identity.email.as_deref().unwrap_or_default(),
            identity.user_metadata.clone(),
        );
        let access_token = jwt::create_token(&claims, &self.jwt_secret).map_err(internal)?;

        Ok(Session {
            access_token,
            refresh_token: None,
            expires_at: Some(claims.exp),
            user: identity.clone(),
        })
    }
}

#[async_trait]
impl Connector for MemoryBackend {
    async fn connect(&self, access_token: Option<&str>) -> BackendResult<SiteClient> {
        let session = match access_token {
            Some(token) => match jwt::validate_token(token, &self.jwt_secret) {
                Ok(claims) => {
                    let store = self.store.lock().await;
                    store.account_by_id(claims.sub).map(|account| Session {
                        access_token: token.to_string(),
                        refresh_token: None,
                        expires_at: Some(claims.exp),
                        user: account.identity.clone(),
                    })
                }
                Err(e) => {
                    debug!(error = %e, "Ignoring unusable access token");
                    None
                }
            },
            None => None,
        };

        Ok(SiteClient {
            identity: Arc::new(MemoryIdentity::new(self.clone(), session)),
            tables: Arc::new(self.tables()),
        })
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// In-memory identity service client
pub struct MemoryIdentity {
    backend: MemoryBackend,
    session: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl MemoryIdentity {
    fn new(backend: MemoryBackend, session: Option<Session>) -> Self {
        let (changes, _) = broadcast::channel(SESSION_FEED_CAPACITY);

        Self {
            backend,
            session: RwLock::new(session),
            changes,
        }
    }

    fn announce(&self, change: SessionChange) {
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl IdentityService for MemoryIdentity {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
        metadata: JsonValue,
    ) -> BackendResult<Option<Identity>> {
        let already_registered = || BackendError::Rejected {
            status: 422,
            message: "User already registered".to_string(),
        };

        {
            let mut store = self.backend.store.lock().await;
            store.record(
                Operation::CreateIdentity,
                json!({ "email": email, "redirect_to": redirect_to, "data": &metadata }),
            )?;

            password::check_password_policy(password)
                .map_err(|message| BackendError::Rejected { status: 422, message })?;

            if store.accounts.contains_key(email) {
                return Err(already_registered());
            }
        }

        // Hashing is slow; the store stays unlocked meanwhile
        let password_hash = password::hash_password(password).map_err(internal)?;

        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: metadata,
        };

        let mut store = self.backend.store.lock().await;
        if store.accounts.contains_key(email) {
            return Err(already_registered());
        }
        store.accounts.insert(
            email.to_string(),
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );

        debug!(user_id = %identity.id, "Account created, confirmation pending");
        Ok(Some(identity))
    }

    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session> {
        let invalid = || BackendError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };

        let (identity, password_hash) = {
            let mut store = self.backend.store.lock().await;
            store.record(Operation::Authenticate, json!({ "email": email }))?;

            let account = store.accounts.get(email).ok_or_else(invalid)?;
            (account.identity.clone(), account.password_hash.clone())
        };

        if !password::verify_password(password, &password_hash).map_err(internal)? {
            return Err(invalid());
        }

        let session = self.backend.issue_session(&identity)?;
        *self.session.write().await = Some(session.clone());
        self.announce(SessionChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.backend
            .store
            .lock()
            .await
            .record(Operation::SignOut, json!({}))?;

        self.session.write().await.take();
        self.announce(SessionChange::signed_out());
        Ok(())
    }

    async fn current_session(&self) -> BackendResult<Option<Session>> {
        self.backend
            .store
            .lock()
            .await
            .record(Operation::CurrentSession, json!({}))?;

        Ok(self.session.read().await.clone())
    }

    fn session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

/// In-memory table store
pub struct MemoryTables {
    store: Arc<Mutex<MemoryStore>>,
}

/// Descending order with missing timestamps first, as Postgres sorts NULLs
fn newest_first(a: &News, b: &News) -> Ordering {
    match (a.published_at, b.published_at) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    }
}

#[async_trait]
impl TableStore for MemoryTables {
    async fn insert_profile(&self, row: NewProfile) -> BackendResult<Profile> {
        let mut store = self.store.lock().await;
        store.record(
            Operation::InsertProfile,
            serde_json::to_value(&row).unwrap_or_default(),
        )?;

        if store.profiles.contains_key(&row.id) {
            return Err(BackendError::Rejected {
                status: 409,
                message: "duplicate key value violates unique constraint \"profiles_pkey\""
                    .to_string(),
            });
        }

        let now = Utc::now();
        let profile = Profile {
            id: row.id,
            full_name: row.full_name,
            nickname: row.nickname,
            position: row.position.map(|p| p.as_str().to_string()),
            birth_date: row.birth_date,
            phone: row.phone,
            avatar_url: None,
            created_at: Some(now),
            updated_at: Some(now),
        };

        store.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn insert_team(&self, row: NewTeam) -> BackendResult<Team> {
        let mut store = self.store.lock().await;
        store.record(
            Operation::InsertTeam,
            serde_json::to_value(&row).unwrap_or_default(),
        )?;

        let team = Team {
            id: Uuid::new_v4(),
            name: row.name,
            founded_year: row.founded_year,
            description: row.description,
            logo_url: None,
            created_at: Some(Utc::now()),
        };

        store.teams.push(team.clone());
        Ok(team)
    }

    async fn find_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        let mut store = self.store.lock().await;
        store.record(Operation::FindProfile, json!({ "id": id }))?;

        Ok(store.profiles.get(&id).cloned())
    }

    async fn find_player_stats(&self, player_id: Uuid) -> BackendResult<Option<PlayerStats>> {
        let mut store = self.store.lock().await;
        store.record(Operation::FindPlayerStats, json!({ "player_id": player_id }))?;

        Ok(store
            .player_stats
            .iter()
            .find(|s| s.player_id == Some(player_id))
            .cloned())
    }

    async fn list_news(&self) -> BackendResult<Vec<News>> {
        let mut store = self.store.lock().await;
        store.record(Operation::ListNews, json!({}))?;

        let mut news = store.news.clone();
        news.sort_by(newest_first);
        Ok(news)
    }
}
