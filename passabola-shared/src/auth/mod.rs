/// Token and password helpers
///
/// # Modules
///
/// - [`jwt`]: HS256 access tokens in the identity service's claim format
/// - [`password`]: Argon2id hashing for the in-memory identity service
///
/// The hosted identity service issues its own tokens. These helpers let the
/// site verify them locally with the project's JWT secret, and let the
/// in-memory identity service issue tokens of the same shape.

pub mod jwt;
pub mod password;
