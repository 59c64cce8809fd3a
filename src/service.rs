//! High-level vault operations used by CLI commands.
//!
//! `VaultService` sits between the caller (who has already resolved the
//! acting owner) and the envelope codec.  It checks the master password
//! against the stored hash, encrypts or decrypts through the codec, and
//! moves envelopes in and out of the store.
//!
//! The master password is passed through to the codec as typed; the
//! stored hash is only ever used as a yes/no oracle.

use std::fmt;

use chrono::Utc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::master_hash::{hash_master_password, MIN_MASTER_PASSWORD_LEN};
use crate::crypto::EnvelopeCodec;
use crate::errors::{Result, VaultError};
use crate::ports::{AccountStore, MasterPasswordVerifier, Notifier, SecretStore};
use crate::vault::{OwnerId, RecordId, SecretMetadata, SecretRecord};

/// A decrypted secret.  The plaintext is wiped from memory on drop.
pub struct RevealedSecret {
    pub id: RecordId,
    pub site: String,
    pub username: Option<String>,
    pub plaintext: Zeroizing<String>,
}

impl fmt::Debug for RevealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealedSecret")
            .field("id", &self.id)
            .field("site", &self.site)
            .field("username", &self.username)
            .field("plaintext", &"<redacted>")
            .finish()
    }
}

/// Orchestrates the store, the codec and the notifier.
pub struct VaultService<S, N> {
    store: S,
    codec: EnvelopeCodec,
    notifier: N,
}

impl<S, N> VaultService<S, N> {
    pub fn new(store: S, codec: EnvelopeCodec, notifier: N) -> Self {
        Self {
            store,
            codec,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S, N> VaultService<S, N>
where
    S: SecretStore + MasterPasswordVerifier,
    N: Notifier,
{
    /// Check `master_password` against the owner's stored hash.
    pub fn verify_master_password(&mut self, owner: &OwnerId, master_password: &str) -> Result<()> {
        if self.store.verify_master_password(owner, master_password)? {
            Ok(())
        } else {
            debug!(owner = %owner, "master password rejected");
            Err(VaultError::InvalidMasterPassword)
        }
    }

    /// Encrypt `plaintext` and store it for `owner`.
    ///
    /// The master password is verified first, so a typo cannot produce an
    /// envelope that the owner's real password will never open.
    pub fn add_secret(
        &mut self,
        owner: &OwnerId,
        site: &str,
        username: Option<&str>,
        plaintext: &str,
        master_password: &str,
    ) -> Result<RecordId> {
        self.verify_master_password(owner, master_password)?;

        let envelope = self.codec.encrypt(plaintext, master_password)?;
        let id = self.store.put(owner, site, username, &envelope)?;

        debug!(owner = %owner, record = %id, "stored secret");
        Ok(id)
    }

    /// Metadata for all of `owner`'s secrets.  No decryption happens.
    pub fn list_secrets(&self, owner: &OwnerId) -> Result<Vec<SecretMetadata>> {
        self.store.list(owner)
    }

    /// Verify the master password, decrypt one record and notify the owner.
    pub fn view_secret(
        &mut self,
        owner: &OwnerId,
        record: &RecordId,
        master_password: &str,
    ) -> Result<RevealedSecret> {
        self.verify_master_password(owner, master_password)?;
        let stored = self.store.get(record, owner)?;
        self.open_record(owner, stored, master_password)
    }

    /// Decrypt an envelope the caller already holds, provided it belongs to
    /// one of `owner`'s records for `site`.
    ///
    /// Unlike `view_secret` this does not consult the master-password
    /// hash; a wrong password surfaces as `DecryptionFailed`.
    pub fn reveal_envelope(
        &mut self,
        owner: &OwnerId,
        site: &str,
        envelope: &str,
        master_password: &str,
    ) -> Result<RevealedSecret> {
        let stored = self
            .store
            .find_by_envelope(owner, site, envelope)?
            .ok_or_else(|| VaultError::SecretNotFound(format!("{} (matching envelope)", site.trim())))?;
        self.open_record(owner, stored, master_password)
    }

    /// Remove one of `owner`'s records.
    pub fn delete_secret(&mut self, owner: &OwnerId, record: &RecordId) -> Result<()> {
        self.store.delete(record, owner)?;
        debug!(owner = %owner, record = %record, "deleted secret");
        Ok(())
    }

    fn open_record(
        &mut self,
        owner: &OwnerId,
        stored: SecretRecord,
        master_password: &str,
    ) -> Result<RevealedSecret> {
        let plaintext = Zeroizing::new(self.codec.decrypt(&stored.envelope, master_password)?);

        let message = format!(
            "Your password for {} was viewed at {}. If this wasn't you, please take necessary actions.",
            stored.site,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Err(e) = self.notifier.notify(owner, &message) {
            warn!(owner = %owner, error = %e, "access notification failed");
        }

        Ok(RevealedSecret {
            id: stored.id,
            site: stored.site,
            username: stored.username,
            plaintext,
        })
    }
}

impl<S, N> VaultService<S, N>
where
    S: SecretStore + MasterPasswordVerifier + AccountStore,
    N: Notifier,
{
    /// Create an account whose master password hash is stored for later
    /// verification.
    pub fn register(&mut self, email: &str, master_password: &str) -> Result<OwnerId> {
        if master_password.chars().count() < MIN_MASTER_PASSWORD_LEN {
            return Err(VaultError::InvalidInput(format!(
                "master password must be at least {MIN_MASTER_PASSWORD_LEN} characters"
            )));
        }

        let hash = hash_master_password(master_password)?;
        let owner = self.store.create_account(email, &hash)?;
        debug!(owner = %owner, "registered account");
        Ok(owner)
    }

    /// Verify the master password, then delete every secret and the
    /// account itself.  Returns the number of secrets removed.
    pub fn close_account(&mut self, owner: &OwnerId, master_password: &str) -> Result<usize> {
        self.verify_master_password(owner, master_password)?;

        let removed = self.store.delete_all(owner)?;
        self.store.remove_account(owner)?;
        debug!(owner = %owner, removed, "closed account");
        Ok(removed)
    }
}
