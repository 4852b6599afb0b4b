//! # Passa a Bola Shared Library
//!
//! This crate contains the data model, the collaborator contracts for the
//! hosted backend, and the page view-models used by the Passa a Bola site.
//!
//! ## Module Organization
//!
//! - `models`: Table rows and their Postgres queries
//! - `backend`: Identity service and table store contracts plus implementations
//! - `auth`: Token and password helpers
//! - `db`: Connection pool and migrations for self-hosted tables
//! - `session`: Shared session context with scoped subscriptions
//! - `site`: Routes, navigation, forms, dashboard and news views

pub mod auth;
pub mod backend;
pub mod db;
pub mod models;
pub mod session;
pub mod site;

/// Current version of the Passa a Bola shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
