/// Table store over a directly reachable Postgres database
///
/// For self-hosted deployments that run the site tables in their own
/// database. Queries live with the models; this type only adapts them to the
/// [`TableStore`] contract and maps constraint violations to rejections.

use crate::{
    backend::{BackendResult, TableStore},
    models::{
        news::News,
        player_stats::PlayerStats,
        profile::{NewProfile, Profile},
        team::{NewTeam, Team},
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Postgres table store
#[derive(Clone)]
pub struct PgTables {
    pool: PgPool,
}

impl PgTables {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TableStore for PgTables {
    async fn insert_profile(&self, row: NewProfile) -> BackendResult<Profile> {
        debug!(profile_id = %row.id, "Inserting profile");
        Ok(Profile::create(&self.pool, row).await?)
    }

    async fn insert_team(&self, row: NewTeam) -> BackendResult<Team> {
        Ok(Team::create(&self.pool, row).await?)
    }

    async fn find_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        Ok(Profile::find_by_id(&self.pool, id).await?)
    }

    async fn find_player_stats(&self, player_id: Uuid) -> BackendResult<Option<PlayerStats>> {
        Ok(PlayerStats::find_by_player(&self.pool, player_id).await?)
    }

    async fn list_news(&self) -> BackendResult<Vec<News>> {
        Ok(News::list_published(&self.pool).await?)
    }
}
