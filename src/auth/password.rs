use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

/// `password_hash::Error` is not a `std::error::Error` without the `std`
/// feature, so it is logged and flattened here.
fn internal(op: &'static str, e: password_hash::Error) -> AppError {
    tracing::error!(error = %e, op, "argon2 failure");
    AppError::Internal(anyhow::anyhow!("{op}: {e}"))
}

/// Hashes with argon2id defaults and a fresh salt; returns the PHC string.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| internal("hash password", e))
}

/// `Ok(false)` on mismatch; `Err` when the stored hash is unusable.
pub fn verify_password(plain: &str, stored: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| internal("parse password hash", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(internal("verify password", e)),
    }
}
