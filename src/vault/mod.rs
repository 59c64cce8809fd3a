//! Vault module — persistence of accounts and encrypted secrets.
//!
//! This module provides:
//! - `Account`, `SecretRecord` and id types (`record`)
//! - Binary vault file format with a SHA-256 checksum (`format`)
//! - `FileVault`, the on-disk implementation of the storage ports (`store`)

pub mod format;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use format::VaultBody;
pub use record::{Account, OwnerId, RecordId, SecretMetadata, SecretRecord};
pub use store::FileVault;
