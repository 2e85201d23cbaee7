//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;
use tracing::warn;

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Hashing could not complete (entropy source or parameter failure)
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Hash a password using Argon2id
///
/// A fresh 16-byte salt is drawn from the OS for every call, so hashing the
/// same password twice yields two different PHC strings that both verify.
///
/// # Example
/// ```
/// use blog_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("secret1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("secret1", &hash));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    // Argon2id, v19, m=19456 t=2 p=1
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC hash
///
/// Returns `false` on mismatch and on a hash that cannot be parsed; it never
/// fails. The digest comparison inside `argon2` is constant-time.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
