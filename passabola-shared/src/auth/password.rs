/// Password hashing for the in-memory identity service
///
/// The hosted identity service owns real credentials. The in-memory service
/// used for development and tests still never keeps plaintext: passwords are
/// stored as Argon2id PHC strings.
///
/// # Example
///
/// ```
/// use passabola_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("camisa10")?;
/// assert!(verify_password("camisa10", &hash)?);
/// assert!(!verify_password("camisa11", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Shortest password the identity service accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored hash could not be parsed or checked
    #[error("Failed to verify password: {0}")]
    VerifyError(String),
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password and an error only when the stored
/// hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Applies the identity service's password rule
///
/// Returns the message the service shows for a rejected password.
pub fn check_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password should be at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("gol_de_placa").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("gol_de_placa", &hash).unwrap());
        assert!(!verify_password("impedimento", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("mesma_senha").unwrap();
        let second = hash_password("mesma_senha").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(check_password_policy("123456").is_ok());
        assert_eq!(
            check_password_policy("12345"),
            Err("Password should be at least 6 characters.".to_string())
        );
    }
}
