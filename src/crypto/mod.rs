//! Cryptographic primitives for SiteVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from the master password (`kdf`)
//! - AES-256-CBC and AES-256-GCM ciphers (`encryption`)
//! - The envelope token wire format (`token`)
//! - The envelope codec tying those together (`envelope`)
//! - Argon2id verification hashes of the master password (`master_hash`)

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod master_hash;
pub mod token;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{EnvelopeCodec, KeyDeriver, ...};
pub use envelope::{EnvelopeCodec, EnvelopeFormat};
pub use kdf::{generate_salt, DerivedKey, KeyDeriver, Pbkdf2Params, Salt};
pub use master_hash::{hash_master_password, verify_master_password_hash};
pub use token::EnvelopeToken;
