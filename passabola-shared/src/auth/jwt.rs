/// Access token issue and verification
///
/// Tokens use the claim layout of the hosted identity service: the subject is
/// the user id, the audience is `authenticated`, and the user's metadata rides
/// along so a session can be rebuilt from the token alone.
///
/// # Example
///
/// ```
/// use passabola_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, "jogadora@example.com", serde_json::json!({}));
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Audience carried by tokens of signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Lifetime of issued access tokens, in seconds
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, audience or format is wrong
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: Uuid,

    /// Email the account was created with
    #[serde(default)]
    pub email: Option<String>,

    /// Audience - `authenticated` for signed-in users
    pub aud: String,

    /// Database role the hosted table API runs requests under
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Metadata supplied at signup
    #[serde(default)]
    pub user_metadata: JsonValue,
}

impl Claims {
    /// Creates claims for a signed-in user with the default lifetime
    pub fn new(user_id: Uuid, email: &str, user_metadata: JsonValue) -> Self {
        Self::with_expiration(
            user_id,
            email,
            user_metadata,
            Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
        )
    }

    /// Creates claims with a custom lifetime
    pub fn with_expiration(
        user_id: Uuid,
        email: &str,
        user_metadata: JsonValue,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: Some(email.to_string()),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            role: AUTHENTICATED_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            user_metadata,
        }
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry and audience, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "bia@example.com", json!({ "full_name": "Bia Zaneratto" }));

        let token = create_token(&claims, SECRET).unwrap();
        let validated = validate_token(&token, SECRET).unwrap();

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email.as_deref(), Some("bia@example.com"));
        assert_eq!(validated.user_metadata["full_name"], "Bia Zaneratto");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com", json!({}));
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "a@example.com",
            json!({}),
            Duration::hours(-2),
        );
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            validate_token("not.a.token", SECRET),
            Err(JwtError::Invalid(_))
        ));
    }
}
