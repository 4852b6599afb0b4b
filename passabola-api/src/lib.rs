//! # Passa a Bola API Server Library
//!
//! HTTP surface of the Passa a Bola site: navigation, session guard,
//! login, player and team registration, the statistics dashboard and news.
//!
//! ## Modules
//!
//! - `app`: Application state, backend connector and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
