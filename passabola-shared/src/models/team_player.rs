/// Team roster rows
///
/// Links profiles to teams. Both foreign keys are nullable and the schema does
/// not enforce one membership per player. The site never writes this table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_players (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID REFERENCES teams (id),
///     player_id UUID REFERENCES profiles (id),
///     jersey_number INTEGER,
///     joined_at TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team roster row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamPlayer {
    pub id: Uuid,
    pub team_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
    pub jersey_number: Option<i32>,
    pub joined_at: Option<DateTime<Utc>>,
}
