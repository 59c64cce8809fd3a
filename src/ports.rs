//! Interfaces to the collaborators around the envelope codec.
//!
//! `VaultService` talks to persistence, the master-password oracle and
//! the notification sink only through these traits.  `FileVault` backs
//! the first three on disk; `notify` has the sinks.

use crate::errors::Result;
use crate::vault::{Account, OwnerId, RecordId, SecretMetadata, SecretRecord};

/// Maps a presented credential to the account it identifies.
pub trait OwnerResolver {
    /// Returns `VaultError::Unauthorized` for unknown credentials.
    fn resolve_owner(&self, credential: &str) -> Result<OwnerId>;
}

/// Boolean oracle over the stored master-password hash.
pub trait MasterPasswordVerifier {
    fn verify_master_password(&mut self, owner: &OwnerId, candidate: &str) -> Result<bool>;
}

/// Storage of opaque envelopes, always scoped by owner.
pub trait SecretStore {
    fn put(
        &mut self,
        owner: &OwnerId,
        site: &str,
        username: Option<&str>,
        envelope: &str,
    ) -> Result<RecordId>;

    /// `VaultError::SecretNotFound` when the record is missing or owned by
    /// someone else.
    fn get(&self, record: &RecordId, owner: &OwnerId) -> Result<SecretRecord>;

    fn delete(&mut self, record: &RecordId, owner: &OwnerId) -> Result<()>;

    /// All of `owner`'s records, oldest first.
    fn list(&self, owner: &OwnerId) -> Result<Vec<SecretMetadata>>;

    /// The record whose site and envelope both match exactly.
    fn find_by_envelope(
        &self,
        owner: &OwnerId,
        site: &str,
        envelope: &str,
    ) -> Result<Option<SecretRecord>>;

    /// Remove every record of `owner`, returning how many were removed.
    fn delete_all(&mut self, owner: &OwnerId) -> Result<usize>;
}

/// Account lifecycle.
pub trait AccountStore {
    fn create_account(&mut self, email: &str, master_password_hash: &str) -> Result<OwnerId>;

    fn account(&self, owner: &OwnerId) -> Result<Account>;

    fn remove_account(&mut self, owner: &OwnerId) -> Result<()>;
}

/// Best-effort notification sink (e.g. "your password was viewed").
pub trait Notifier {
    fn notify(&self, owner: &OwnerId, message: &str) -> Result<()>;
}
