/// Table rows for the Passa a Bola site
///
/// Each module holds one table's row type, its insert payload (when the site
/// writes to it), and the Postgres queries used by
/// [`PgTables`](crate::backend::postgres::PgTables).
///
/// # Models
///
/// - `profile`: Player profiles, keyed by the identity service's user id
/// - `team`: Teams registered for the tournament
/// - `team_player`: Team rosters (read-only for the site)
/// - `player_stats`: Per-player statistics (seeded out-of-band, read-only)
/// - `news`: News posts (authored out-of-band, read-only)
///
/// # Example
///
/// ```no_run
/// use passabola_shared::models::profile::{NewProfile, Position, Profile};
/// use passabola_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let profile = Profile::create(
///     &pool,
///     NewProfile {
///         id: Uuid::new_v4(),
///         full_name: "Marta Vieira da Silva".to_string(),
///         nickname: Some("Marta".to_string()),
///         position: Some(Position::Atacante),
///         birth_date: None,
///         phone: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod news;
pub mod player_stats;
pub mod profile;
pub mod team;
pub mod team_player;
