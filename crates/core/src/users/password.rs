//! Password hashing.
//!
//! New passwords are stored as Argon2 PHC strings. Accounts migrated from the
//! previous service carry an unsalted SHA-256 hex digest, which is still
//! accepted on login.

use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::errors::{Error, Result};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Returns `Ok(false)` for a wrong password and `Err` only when the stored
/// hash itself is unusable.
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool> {
    if stored_hash.starts_with('$') {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
        return match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(other) => Err(Error::PasswordHash(other.to_string())),
        };
    }

    let digest = hex::encode(Sha256::digest(candidate.as_bytes()));
    Ok(digest.eq_ignore_ascii_case(stored_hash.trim()))
}
