/// Personal statistics dashboard
///
/// Needs a session. The profile and the statistics row are read
/// concurrently, and the view settles in an explicit state once both reads
/// have answered: ready, one of the rows missing, or failed.

use super::routes::Route;
use crate::{
    backend::TableStore,
    models::{player_stats::PlayerStats, profile::Profile},
    session::SessionContext,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Counters shown on the dashboard; missing counts read as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatLine {
    pub matches_played: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
}

impl From<&PlayerStats> for StatLine {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            matches_played: stats.matches_played.unwrap_or(0),
            goals: stats.goals.unwrap_or(0),
            assists: stats.assists.unwrap_or(0),
            yellow_cards: stats.yellow_cards.unwrap_or(0),
            red_cards: stats.red_cards.unwrap_or(0),
        }
    }
}

fn greeting(profile: &Profile) -> String {
    format!("Olá, {}!", profile.display_name())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub greeting: String,
    pub full_name: String,
    pub position: Option<String>,
    pub stats: StatLine,
}

impl Dashboard {
    pub fn new(profile: &Profile, stats: &PlayerStats) -> Self {
        Self {
            greeting: greeting(profile),
            full_name: profile.full_name.clone(),
            position: profile.position.clone(),
            stats: StatLine::from(stats),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardState {
    Loading,

    /// No session; the visitor belongs elsewhere
    Redirect { to: Route },

    Ready(Dashboard),

    MissingProfile { message: String },

    MissingStats { greeting: String, message: String },

    Failed { message: String },
}

impl DashboardState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DashboardState::Loading)
    }
}

/// Dashboard page
pub struct DashboardView {
    tables: Arc<dyn TableStore>,
    session: SessionContext,
    state: watch::Sender<DashboardState>,
}

impl DashboardView {
    pub(crate) fn new(tables: Arc<dyn TableStore>, session: SessionContext) -> Self {
        let (state, _) = watch::channel(DashboardState::Loading);

        Self {
            tables,
            session,
            state,
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Loads the dashboard of the signed-in player
    pub async fn load(&self) -> DashboardState {
        self.state.send_replace(DashboardState::Loading);

        let next = self.resolve().await;
        self.state.send_replace(next.clone());
        next
    }

    async fn resolve(&self) -> DashboardState {
        let state = self.session.settled().await;
        let Some(session) = state.session() else {
            return DashboardState::Redirect { to: Route::Login };
        };
        let player_id = session.user.id;

        let (profile, stats) = tokio::join!(
            self.tables.find_profile(player_id),
            self.tables.find_player_stats(player_id),
        );

        match (profile, stats) {
            (Err(e), _) | (_, Err(e)) => {
                warn!(%player_id, error = %e, "Dashboard read failed");
                DashboardState::Failed {
                    message: e.user_message(),
                }
            }
            (Ok(None), _) => {
                debug!(%player_id, "No profile row for signed-in user");
                DashboardState::MissingProfile {
                    message: "Perfil não encontrado. Complete seu cadastro de jogadora."
                        .to_string(),
                }
            }
            (Ok(Some(profile)), Ok(None)) => DashboardState::MissingStats {
                greeting: greeting(&profile),
                message: "Suas estatísticas ainda não estão disponíveis.".to_string(),
            },
            (Ok(Some(profile)), Ok(Some(stats))) => {
                DashboardState::Ready(Dashboard::new(&profile, &stats))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{
            memory::{MemoryBackend, Operation},
            BackendError, Connector, IdentityService, SiteClient,
        },
        models::profile::Profile,
    };
    use serde_json::json;
    use uuid::Uuid;

    fn backend() -> MemoryBackend {
        MemoryBackend::new("dashboard-test-secret-at-least-32-bytes")
    }

    async fn signed_in(backend: &MemoryBackend) -> (SiteClient, Uuid) {
        let user = backend
            .add_user("marta@example.com", "segredo123", json!({}))
            .await
            .unwrap();
        let session = backend
            .identity()
            .authenticate("marta@example.com", "segredo123")
            .await
            .unwrap();
        let client = backend.connect(Some(&session.access_token)).await.unwrap();
        (client, user.id)
    }

    fn view(client: SiteClient) -> DashboardView {
        let session = SessionContext::start(client.identity.clone());
        DashboardView::new(client.tables, session)
    }

    fn profile(id: Uuid, nickname: Option<&str>) -> Profile {
        Profile {
            id,
            full_name: "Marta Vieira da Silva".to_string(),
            nickname: nickname.map(str::to_string),
            position: Some("Atacante".to_string()),
            birth_date: None,
            phone: None,
            avatar_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn stats(player_id: Uuid) -> PlayerStats {
        PlayerStats {
            id: Uuid::new_v4(),
            player_id: Some(player_id),
            matches_played: Some(12),
            goals: Some(9),
            assists: None,
            yellow_cards: Some(1),
            red_cards: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_without_session_redirects_to_login() {
        let backend = backend();

        let state = view(backend.client()).load().await;

        assert_eq!(state, DashboardState::Redirect { to: Route::Login });
        assert_eq!(backend.count(Operation::FindProfile).await, 0);
    }

    #[tokio::test]
    async fn test_ready_with_nulls_as_zero() {
        let backend = backend();
        let (client, id) = signed_in(&backend).await;
        backend.seed_profile(profile(id, Some("Marta"))).await;
        backend.seed_player_stats(stats(id)).await;

        let view = view(client);
        let state = view.load().await;

        let DashboardState::Ready(dashboard) = state else {
            panic!("expected ready dashboard, got {:?}", state);
        };
        assert_eq!(dashboard.greeting, "Olá, Marta!");
        assert_eq!(dashboard.stats.goals, 9);
        assert_eq!(dashboard.stats.assists, 0);
        assert_eq!(dashboard.stats.red_cards, 0);
        assert!(view.state().is_terminal());
        assert_eq!(backend.count(Operation::FindPlayerStats).await, 1);
    }

    #[tokio::test]
    async fn test_missing_profile_is_terminal() {
        let backend = backend();
        let (client, id) = signed_in(&backend).await;
        backend.seed_player_stats(stats(id)).await;

        let state = view(client).load().await;

        assert!(matches!(state, DashboardState::MissingProfile { .. }));
        assert!(state.is_terminal());
    }

    #[tokio::test]
    async fn test_missing_stats_greets_by_full_name() {
        let backend = backend();
        let (client, id) = signed_in(&backend).await;
        backend.seed_profile(profile(id, None)).await;

        let state = view(client).load().await;

        match state {
            DashboardState::MissingStats { greeting, .. } => {
                assert_eq!(greeting, "Olá, Marta Vieira da Silva!")
            }
            other => panic!("expected missing stats, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_explicit() {
        let backend = backend();
        let (client, id) = signed_in(&backend).await;
        backend.seed_profile(profile(id, None)).await;
        backend
            .fail_next(
                Operation::FindPlayerStats,
                BackendError::Transport("connection refused".to_string()),
            )
            .await;

        let state = view(client).load().await;

        assert!(matches!(state, DashboardState::Failed { .. }));
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let value = serde_json::to_value(DashboardState::Redirect { to: Route::Login }).unwrap();
        assert_eq!(value, json!({ "state": "redirect", "to": "/login" }));
    }
}
