//! Argon2id password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, password_hash};
use rand::RngCore;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The hashing backend failed (e.g. could not allocate its memory cost).
    #[error("password hashing failed: {0}")]
    Hashing(password_hash::Error),
    /// The stored digest is not a PHC string argon2 understands.
    #[error("malformed password digest: {0}")]
    MalformedDigest(password_hash::Error),
}

/// Hash a password with a fresh random salt. The returned PHC string embeds
/// the algorithm, cost parameters and salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(PasswordError::Hashing)?;

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hashing)
}

/// Check a password against a stored digest.
///
/// A wrong password is `Ok(false)`; only an unparseable digest is an error.
pub fn verify_password(plain: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(PasswordError::MalformedDigest)?;

    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hashing(e)),
    }
}
