/// Team model and database operations
///
/// Teams are created by any signed-in player. No ownership link is stored.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     founded_year INTEGER,
///     description TEXT,
///     logo_url TEXT,
///     created_at TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Team row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,

    /// Team name (required)
    pub name: String,

    pub founded_year: Option<i32>,

    pub description: Option<String>,

    pub logo_url: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
}

/// Input for inserting a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub founded_year: Option<i32>,
    pub description: Option<String>,
}

impl Team {
    /// Inserts a team row and returns it with its generated id
    pub async fn create(pool: &PgPool, data: NewTeam) -> Result<Self, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, founded_year, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, founded_year, description, logo_url, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.founded_year)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(team)
    }
}
