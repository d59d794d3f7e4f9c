/// Password hashing using Argon2id
///
/// Plaintext passwords are hashed before persistence and never stored.
/// The output is a PHC string carrying algorithm, parameters, and salt,
/// so verification needs no additional state.
///
/// # Example
///
/// ```
/// use gatehouse_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter2")?;
/// assert!(verify_password("hunter2", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// Stored hash is not a valid PHC string
    #[error("invalid password hash: {0}")]
    InvalidHash(String),

    /// Verification failed for a reason other than a mismatch
    #[error("failed to verify password: {0}")]
    Verify(String),
}

/// Hashes a plaintext password with Argon2id and a random salt.
///
/// Returns the PHC string form (`$argon2id$v=19$...`). Every call salts
/// freshly, so hashing the same password twice yields different strings.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on a mismatch; errors are reserved for malformed
/// hashes and operational failures. Comparison is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_string() {
        let hash = hash_password("secret").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_never_equals_plaintext() {
        let password = "plain-text-password";
        let hash = hash_password(password).expect("hash should succeed");
        assert_ne!(hash, password);
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = hash_password("same").expect("hash should succeed");
        let second = hash_password("same").expect("hash should succeed");
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("correct horse").expect("hash should succeed");
        assert!(verify_password("correct horse", &hash).expect("verify should succeed"));
        assert!(!verify_password("battery staple", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
        assert!(verify_password("anything", "$argon2id$broken").is_err());
    }
}
