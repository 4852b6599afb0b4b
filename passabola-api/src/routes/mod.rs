/// API route handlers
///
/// Handlers are organized by page:
///
/// - `health`: Health check endpoint
/// - `site`: Navigation bar and session guard
/// - `auth`: Login and logout
/// - `register`: Player and team registration
/// - `dashboard`: Personal statistics
/// - `news`: News listing
///
/// Every `/v1` handler receives the request's [`passabola_shared::site::Site`]
/// as an extension, opened for the caller's Bearer token.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod news;
pub mod register;
pub mod site;
