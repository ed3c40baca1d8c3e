//! Password hashing — Argon2id PHC strings, constant-time verification.
//!
//! Passwords are hashed before they ever reach the store; plaintext
//! comparison is not an option anywhere in this crate.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::{Error, Result};

/// Hash a password into an Argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| Error::Internal(format!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Internal(format!("salt encoding failed: {e}")))?;

    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(phc)
}

/// Verify a password against a stored PHC hash.
///
/// An unparseable hash verifies as false rather than erroring — a corrupt
/// credential row must read as "wrong password", not a 500.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}
