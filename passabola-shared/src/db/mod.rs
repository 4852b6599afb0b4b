/// Database layer for self-hosted tables
///
/// The site normally reaches its tables through the hosted REST API. When a
/// `DATABASE_URL` is configured it talks to Postgres directly instead, using
/// the pool and migrations defined here.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Schema migrations for the site tables

pub mod migrations;
pub mod pool;
