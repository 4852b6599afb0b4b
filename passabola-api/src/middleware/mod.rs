/// Middleware modules for the API server
///
/// The per-request site client lives in [`crate::app`]; this module holds
/// the response header layer.

pub mod security;
