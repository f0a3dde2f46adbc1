//! Argon2 password hashing.
//!
//! Hashes are stored as PHC strings, so the salt and cost parameters
//! travel with the hash and verification needs nothing else. The final
//! digest comparison inside `verify_password` is constant-time.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};

use crate::StoreError;

/// Hashes `password` with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Checks `password` against a stored PHC string.
///
/// Returns `Ok(false)` on a mismatch. A hash that can't be parsed is a
/// data fault, reported as [`StoreError::Corrupt`], not as a mismatch.
///
/// This is deliberately slow; call it off the async executor.
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, StoreError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
