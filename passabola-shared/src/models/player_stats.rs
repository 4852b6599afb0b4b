/// Player statistics
///
/// One row per player, seeded out-of-band. The site only reads it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE player_stats (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     player_id UUID UNIQUE REFERENCES profiles (id),
///     matches_played INTEGER DEFAULT 0,
///     goals INTEGER DEFAULT 0,
///     assists INTEGER DEFAULT 0,
///     yellow_cards INTEGER DEFAULT 0,
///     red_cards INTEGER DEFAULT 0,
///     created_at TIMESTAMPTZ DEFAULT NOW(),
///     updated_at TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Player statistics row
///
/// Counts are nullable in the schema; no non-negativity is enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerStats {
    pub id: Uuid,
    pub player_id: Option<Uuid>,
    pub matches_played: Option<i32>,
    pub goals: Option<i32>,
    pub assists: Option<i32>,
    pub yellow_cards: Option<i32>,
    pub red_cards: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PlayerStats {
    /// Finds the statistics row of a player
    pub async fn find_by_player(
        pool: &PgPool,
        player_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let stats = sqlx::query_as::<_, PlayerStats>(
            r#"
            SELECT id, player_id, matches_played, goals, assists, yellow_cards, red_cards,
                   created_at, updated_at
            FROM player_stats
            WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(pool)
        .await?;

        Ok(stats)
    }
}
