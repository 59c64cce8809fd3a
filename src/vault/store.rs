//! File-backed persistence for accounts and envelopes.
//!
//! `FileVault` keeps the whole vault in memory and writes it back
//! atomically after every mutation, so the file on disk is always a
//! complete, checksummed snapshot.  It never sees plaintext: secrets
//! arrive and leave as envelope strings.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::crypto::master_hash::verify_master_password_hash;
use crate::errors::{Result, VaultError};
use crate::ports::{AccountStore, MasterPasswordVerifier, OwnerResolver, SecretStore};

use super::format::{self, VaultBody};
use super::record::{Account, OwnerId, RecordId, SecretMetadata, SecretRecord};

/// Maximum length of site and username fields.
const MAX_FIELD_LEN: usize = 256;

/// The main vault handle.  Create one with `FileVault::open_or_create`
/// or `FileVault::open`.
pub struct FileVault {
    /// Path to the `.svlt` file on disk.
    path: PathBuf,

    /// In-memory copy of the file body.
    body: VaultBody,
}

impl FileVault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open an existing vault file, verifying its checksum.
    pub fn open(path: &Path) -> Result<Self> {
        let body = format::read_vault(path)?;
        debug!(
            path = %path.display(),
            accounts = body.accounts.len(),
            secrets = body.secrets.len(),
            "opened vault"
        );
        Ok(Self {
            path: path.to_path_buf(),
            body,
        })
    }

    /// Open the vault at `path`, creating an empty one (and its parent
    /// directory) if none exists yet.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::open(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut vault = Self {
            path: path.to_path_buf(),
            body: VaultBody::default(),
        };
        vault.save()?;
        debug!(path = %path.display(), "created vault");
        Ok(vault)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the vault to disk atomically.
    pub fn save(&mut self) -> Result<()> {
        format::write_vault(&self.path, &self.body)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn account_count(&self) -> usize {
        self.body.accounts.len()
    }

    pub fn secret_count(&self) -> usize {
        self.body.secrets.len()
    }

    fn account_ref(&self, owner: &OwnerId) -> Result<&Account> {
        self.body
            .accounts
            .iter()
            .find(|a| &a.id == owner)
            .ok_or_else(|| VaultError::AccountNotFound(owner.to_string()))
    }

    /// Apply `change` to a copy of the body and adopt the copy only once
    /// it is on disk.  A failed write leaves memory and file unchanged.
    fn commit<T>(&mut self, change: impl FnOnce(&mut VaultBody) -> Result<T>) -> Result<T> {
        let mut next = self.body.clone();
        let out = change(&mut next)?;
        format::write_vault(&self.path, &next)?;
        self.body = next;
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validate a site name: non-empty after trimming, bounded length,
    /// no control characters.
    fn validate_site(site: &str) -> Result<&str> {
        let site = site.trim();
        if site.is_empty() {
            return Err(VaultError::InvalidInput("site cannot be empty".into()));
        }
        Self::validate_field("site", site)?;
        Ok(site)
    }

    fn validate_field(name: &str, value: &str) -> Result<()> {
        if value.len() > MAX_FIELD_LEN {
            return Err(VaultError::InvalidInput(format!(
                "{name} cannot exceed {MAX_FIELD_LEN} characters"
            )));
        }
        if value.chars().any(char::is_control) {
            return Err(VaultError::InvalidInput(format!(
                "{name} cannot contain control characters"
            )));
        }
        Ok(())
    }

    /// Very small sanity check: something@something.something.
    fn normalize_email(email: &str) -> Result<String> {
        let email = email.trim().to_ascii_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !domain.contains('@')
            }
            None => false,
        };
        if !valid || email.chars().any(char::is_whitespace) {
            return Err(VaultError::InvalidInput(format!(
                "'{email}' is not a valid email address"
            )));
        }
        Self::validate_field("email", &email)?;
        Ok(email)
    }
}

impl OwnerResolver for FileVault {
    fn resolve_owner(&self, credential: &str) -> Result<OwnerId> {
        let email = credential.trim().to_ascii_lowercase();
        self.body
            .accounts
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.id.clone())
            .ok_or_else(|| VaultError::Unauthorized(format!("no account for '{email}'")))
    }
}

impl MasterPasswordVerifier for FileVault {
    fn verify_master_password(&mut self, owner: &OwnerId, candidate: &str) -> Result<bool> {
        let account = self.account_ref(owner)?;
        if !verify_master_password_hash(candidate, &account.master_password_hash)? {
            return Ok(false);
        }

        // Bookkeeping only; the answer stands even if it cannot be saved.
        let stamped = self.commit(|body| {
            if let Some(a) = body.accounts.iter_mut().find(|a| &a.id == owner) {
                a.last_access = Some(Utc::now());
            }
            Ok(())
        });
        if let Err(e) = stamped {
            warn!(owner = %owner, error = %e, "could not record last access");
        }
        Ok(true)
    }
}

impl AccountStore for FileVault {
    fn create_account(&mut self, email: &str, master_password_hash: &str) -> Result<OwnerId> {
        let email = Self::normalize_email(email)?;
        if self.body.accounts.iter().any(|a| a.email == email) {
            return Err(VaultError::AccountAlreadyExists(email));
        }

        let id = OwnerId::generate();
        let account = Account {
            id: id.clone(),
            email,
            master_password_hash: master_password_hash.to_string(),
            created_at: Utc::now(),
            last_access: None,
        };
        self.commit(|body| {
            body.accounts.push(account);
            Ok(())
        })?;
        Ok(id)
    }

    fn account(&self, owner: &OwnerId) -> Result<Account> {
        self.account_ref(owner).cloned()
    }

    fn remove_account(&mut self, owner: &OwnerId) -> Result<()> {
        self.commit(|body| {
            let before = body.accounts.len();
            body.accounts.retain(|a| &a.id != owner);
            if body.accounts.len() == before {
                return Err(VaultError::AccountNotFound(owner.to_string()));
            }
            Ok(())
        })
    }
}

impl SecretStore for FileVault {
    fn put(
        &mut self,
        owner: &OwnerId,
        site: &str,
        username: Option<&str>,
        envelope: &str,
    ) -> Result<RecordId> {
        // Make sure the owner exists before storing anything for it.
        self.account_ref(owner)?;

        let site = Self::validate_site(site)?.to_string();
        let username = match username.map(str::trim) {
            Some("") | None => None,
            Some(u) => {
                Self::validate_field("username", u)?;
                Some(u.to_string())
            }
        };

        let id = RecordId::generate();
        let record = SecretRecord {
            id: id.clone(),
            owner_id: owner.clone(),
            site,
            username,
            envelope: envelope.to_string(),
            created_at: Utc::now(),
        };
        self.commit(|body| {
            body.secrets.push(record);
            Ok(())
        })?;
        Ok(id)
    }

    fn get(&self, record: &RecordId, owner: &OwnerId) -> Result<SecretRecord> {
        self.body
            .secrets
            .iter()
            .find(|s| &s.id == record && &s.owner_id == owner)
            .cloned()
            .ok_or_else(|| VaultError::SecretNotFound(record.to_string()))
    }

    fn delete(&mut self, record: &RecordId, owner: &OwnerId) -> Result<()> {
        self.commit(|body| {
            let before = body.secrets.len();
            body.secrets
                .retain(|s| !(&s.id == record && &s.owner_id == owner));
            if body.secrets.len() == before {
                return Err(VaultError::SecretNotFound(record.to_string()));
            }
            Ok(())
        })
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<SecretMetadata>> {
        let mut list: Vec<SecretMetadata> = self
            .body
            .secrets
            .iter()
            .filter(|s| &s.owner_id == owner)
            .map(SecretMetadata::from)
            .collect();

        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    fn find_by_envelope(
        &self,
        owner: &OwnerId,
        site: &str,
        envelope: &str,
    ) -> Result<Option<SecretRecord>> {
        let site = site.trim();
        Ok(self
            .body
            .secrets
            .iter()
            .find(|s| &s.owner_id == owner && s.site == site && s.envelope == envelope)
            .cloned())
    }

    fn delete_all(&mut self, owner: &OwnerId) -> Result<usize> {
        if !self.body.secrets.iter().any(|s| &s.owner_id == owner) {
            return Ok(0);
        }
        self.commit(|body| {
            let before = body.secrets.len();
            body.secrets.retain(|s| &s.owner_id != owner);
            Ok(before - body.secrets.len())
        })
    }
}
