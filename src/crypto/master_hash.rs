//! One-way Argon2id hash of the master password, used only to check a
//! candidate password before any decryption is attempted.
//!
//! This hash is never key material: envelope keys are always derived
//! from the password the user typed, through `KeyDeriver`.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::kdf::random_bytes;
use crate::errors::{Result, VaultError};

/// Minimum master password length accepted at signup.
pub const MIN_MASTER_PASSWORD_LEN: usize = 6;

/// Hash `master_password` into a self-describing PHC string.
pub fn hash_master_password(master_password: &str) -> Result<String> {
    let salt_bytes = random_bytes::<16>();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| VaultError::PasswordHashFailed(format!("salt encoding: {e}")))?;

    let hash = Argon2::default()
        .hash_password(master_password.as_bytes(), &salt)
        .map_err(|e| VaultError::PasswordHashFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check `candidate` against a stored PHC string.
///
/// A stored hash that cannot be parsed is an error; a mismatch is `false`.
pub fn verify_master_password_hash(candidate: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| VaultError::PasswordHashFailed(format!("stored hash is invalid: {e}")))?;

    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
