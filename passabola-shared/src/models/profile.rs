/// Profile model and database operations
///
/// A profile is the site-level record of a player. Its id is the identity
/// service's user id, assigned when the account is created, so the row is
/// always written after the identity exists.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY,
///     full_name TEXT NOT NULL,
///     nickname TEXT,
///     position TEXT,
///     birth_date DATE,
///     phone TEXT,
///     avatar_url TEXT,
///     created_at TIMESTAMPTZ DEFAULT NOW(),
///     updated_at TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Playing position offered by the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goleira,
    Zagueira,
    Lateral,
    Volante,
    Meia,
    Atacante,
}

impl Position {
    /// All positions, in the order the form lists them
    pub const ALL: [Position; 6] = [
        Position::Goleira,
        Position::Zagueira,
        Position::Lateral,
        Position::Volante,
        Position::Meia,
        Position::Atacante,
    ];

    /// Gets the position as stored in the `position` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Goleira => "Goleira",
            Position::Zagueira => "Zagueira",
            Position::Lateral => "Lateral",
            Position::Volante => "Volante",
            Position::Meia => "Meia",
            Position::Atacante => "Atacante",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known positions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown position: {0}")]
pub struct UnknownPosition(pub String);

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPosition(s.to_string()))
    }
}

/// Profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Identity service user id
    pub id: Uuid,

    /// Full name (required)
    pub full_name: String,

    pub nickname: Option<String>,

    /// Free text in the schema; the site only writes [`Position`] values
    pub position: Option<String>,

    /// Calendar date, serialized as `YYYY-MM-DD`
    pub birth_date: Option<NaiveDate>,

    pub phone: Option<String>,

    pub avatar_url: Option<String>,

    pub created_at: Option<DateTime<Utc>>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Name shown in greetings: the nickname when set, otherwise the full name
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.full_name)
    }
}

/// Input for inserting a profile
///
/// `id` must be the id returned by the identity service when the account
/// was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub nickname: Option<String>,
    pub position: Option<Position>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

impl Profile {
    /// Inserts a profile row
    ///
    /// # Errors
    ///
    /// Returns an error if a profile with the same id already exists or the
    /// database is unreachable.
    pub async fn create(pool: &PgPool, data: NewProfile) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, full_name, nickname, position, birth_date, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, nickname, position, birth_date, phone, avatar_url,
                      created_at, updated_at
            "#,
        )
        .bind(data.id)
        .bind(data.full_name)
        .bind(data.nickname)
        .bind(data.position.map(|p| p.as_str()))
        .bind(data.birth_date)
        .bind(data.phone)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Finds a profile by id
    ///
    /// Returns `None` if no row exists.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, full_name, nickname, position, birth_date, phone, avatar_url,
                   created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_round_trips_through_str() {
        for position in Position::ALL {
            assert_eq!(position.as_str().parse::<Position>(), Ok(position));
        }
        assert!("Pivô".parse::<Position>().is_err());
    }

    #[test]
    fn test_new_profile_serializes_birth_date_without_time() {
        let profile = NewProfile {
            id: Uuid::nil(),
            full_name: "Formiga".to_string(),
            nickname: None,
            position: Some(Position::Volante),
            birth_date: NaiveDate::from_ymd_opt(1978, 3, 3),
            phone: None,
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["birth_date"], json!("1978-03-03"));
        assert_eq!(value["position"], json!("Volante"));
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let mut profile: Profile = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "full_name": "Cristiane Rozeira de Souza Silva",
            "nickname": "Cristiane",
            "position": "Atacante",
            "birth_date": null,
            "phone": null,
            "avatar_url": null,
            "created_at": null,
            "updated_at": null
        }))
        .unwrap();
        assert_eq!(profile.display_name(), "Cristiane");

        profile.nickname = Some("  ".to_string());
        assert_eq!(profile.display_name(), "Cristiane Rozeira de Souza Silva");
    }
}
