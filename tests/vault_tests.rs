//! Integration tests for the on-disk vault store.

use std::fs;

use tempfile::TempDir;

use sitevault::crypto::hash_master_password;
use sitevault::errors::VaultError;
use sitevault::ports::{AccountStore, MasterPasswordVerifier, OwnerResolver, SecretStore};
use sitevault::vault::{FileVault, RecordId};

fn new_vault(dir: &TempDir) -> FileVault {
    FileVault::open_or_create(&dir.path().join("nested").join("vault.svlt")).unwrap()
}

#[test]
fn open_or_create_makes_parent_dir_and_file() {
    let dir = TempDir::new().unwrap();
    let vault = new_vault(&dir);
    assert!(vault.path().exists());
    assert_eq!(vault.account_count(), 0);
    assert_eq!(vault.secret_count(), 0);
}

#[test]
fn open_missing_vault_fails() {
    let dir = TempDir::new().unwrap();
    let err = FileVault::open(&dir.path().join("absent.svlt")).err().unwrap();
    assert!(matches!(err, VaultError::VaultNotFound(_)));
}

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);

    let owner = vault.create_account("alice@example.com", "hash").unwrap();
    let id = vault
        .put(&owner, " github.com ", Some("octocat"), "aa:bb:cc")
        .unwrap();

    let reopened = FileVault::open(vault.path()).unwrap();
    assert_eq!(reopened.resolve_owner("ALICE@example.com").unwrap(), owner);

    let record = reopened.get(&id, &owner).unwrap();
    assert_eq!(record.site, "github.com");
    assert_eq!(record.username.as_deref(), Some("octocat"));
    assert_eq!(record.envelope, "aa:bb:cc");
}

#[test]
fn duplicate_email_rejected() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);

    vault.create_account("bob@example.com", "h").unwrap();
    let err = vault.create_account(" Bob@Example.com", "h").unwrap_err();
    assert!(matches!(err, VaultError::AccountAlreadyExists(_)));
}

#[test]
fn unknown_user_is_unauthorized() {
    let dir = TempDir::new().unwrap();
    let vault = new_vault(&dir);
    let err = vault.resolve_owner("nobody@example.com").unwrap_err();
    assert!(matches!(err, VaultError::Unauthorized(_)));
}

#[test]
fn records_are_isolated_per_owner() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);

    let alice = vault.create_account("alice@example.com", "h").unwrap();
    let mallory = vault.create_account("mallory@example.com", "h").unwrap();

    let id = vault.put(&alice, "bank.com", None, "env").unwrap();

    assert!(matches!(
        vault.get(&id, &mallory).unwrap_err(),
        VaultError::SecretNotFound(_)
    ));
    assert!(matches!(
        vault.delete(&id, &mallory).unwrap_err(),
        VaultError::SecretNotFound(_)
    ));
    assert!(vault.list(&mallory).unwrap().is_empty());
    assert!(vault
        .find_by_envelope(&mallory, "bank.com", "env")
        .unwrap()
        .is_none());

    // Still there for its real owner.
    assert_eq!(vault.list(&alice).unwrap().len(), 1);
}

#[test]
fn find_by_envelope_requires_matching_site() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let owner = vault.create_account("alice@example.com", "h").unwrap();
    vault.put(&owner, "github.com", None, "env-1").unwrap();

    assert!(vault
        .find_by_envelope(&owner, "github.com", "env-1")
        .unwrap()
        .is_some());
    assert!(vault
        .find_by_envelope(&owner, "gitlab.com", "env-1")
        .unwrap()
        .is_none());
    assert!(vault
        .find_by_envelope(&owner, "github.com", "env-2")
        .unwrap()
        .is_none());
}

#[test]
fn delete_and_delete_all() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let owner = vault.create_account("alice@example.com", "h").unwrap();
    let other = vault.create_account("bob@example.com", "h").unwrap();

    let a = vault.put(&owner, "a.com", None, "e1").unwrap();
    vault.put(&owner, "b.com", None, "e2").unwrap();
    vault.put(&other, "c.com", None, "e3").unwrap();

    vault.delete(&a, &owner).unwrap();
    assert!(vault.get(&a, &owner).is_err());

    assert_eq!(vault.delete_all(&owner).unwrap(), 1);
    assert_eq!(vault.delete_all(&owner).unwrap(), 0);
    assert_eq!(vault.list(&other).unwrap().len(), 1);
}

#[test]
fn put_for_unknown_owner_fails() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let ghost = sitevault::vault::OwnerId::generate();
    let err = vault.put(&ghost, "a.com", None, "e").unwrap_err();
    assert!(matches!(err, VaultError::AccountNotFound(_)));
}

#[test]
fn verify_master_password_tracks_last_access() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let hash = hash_master_password("correct-horse").unwrap();
    let owner = vault.create_account("alice@example.com", &hash).unwrap();

    assert!(!vault.verify_master_password(&owner, "wrong-horse").unwrap());
    assert!(vault.account(&owner).unwrap().last_access.is_none());

    assert!(vault.verify_master_password(&owner, "correct-horse").unwrap());
    let reopened = FileVault::open(vault.path()).unwrap();
    assert!(reopened.account(&owner).unwrap().last_access.is_some());
}

#[test]
fn remove_account_keeps_others() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let a = vault.create_account("a@example.com", "h").unwrap();
    let b = vault.create_account("b@example.com", "h").unwrap();

    vault.remove_account(&a).unwrap();
    assert!(matches!(
        vault.remove_account(&a).unwrap_err(),
        VaultError::AccountNotFound(_)
    ));
    assert_eq!(vault.account(&b).unwrap().email, "b@example.com");
}

#[test]
fn corrupted_file_detected() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    vault.create_account("alice@example.com", "h").unwrap();
    let path = vault.path().to_path_buf();

    let mut bytes = fs::read(&path).unwrap();
    // Flip a byte inside the JSON body.
    bytes[12] ^= 0x01;
    fs::write(&path, &bytes).unwrap();

    let err = FileVault::open(&path).err().unwrap();
    assert!(matches!(err, VaultError::ChecksumMismatch));
}

#[test]
fn unknown_record_id_not_found() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let owner = vault.create_account("alice@example.com", "h").unwrap();
    let err = vault
        .get(&RecordId::from("ffffffffffffffffffffffff"), &owner)
        .unwrap_err();
    assert!(matches!(err, VaultError::SecretNotFound(_)));
}

#[cfg(unix)]
#[test]
fn vault_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let vault = new_vault(&dir);
    let mode = fs::metadata(vault.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ---------------------------------------------------------------------------
// Failed writes
// ---------------------------------------------------------------------------

/// Remove the directory holding the vault so the next write fails.
fn make_unwritable(vault: &FileVault) {
    fs::remove_dir_all(vault.path().parent().unwrap()).unwrap();
}

#[test]
fn failed_put_leaves_records_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let owner = vault.create_account("alice@example.com", "h").unwrap();
    vault.put(&owner, "kept.com", None, "e1").unwrap();

    make_unwritable(&vault);
    assert!(vault.put(&owner, "github.com", None, "aa:bb:cc").is_err());
    assert_eq!(vault.list(&owner).unwrap().len(), 1);

    // A later successful save must not resurrect the rejected record.
    fs::create_dir_all(vault.path().parent().unwrap()).unwrap();
    vault.save().unwrap();
    let reopened = FileVault::open(vault.path()).unwrap();
    let sites: Vec<String> = reopened
        .list(&owner)
        .unwrap()
        .into_iter()
        .map(|m| m.site)
        .collect();
    assert_eq!(sites, vec!["kept.com".to_string()]);
}

#[test]
fn failed_deletes_keep_data_in_memory() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let owner = vault.create_account("alice@example.com", "h").unwrap();
    let id = vault.put(&owner, "a.com", None, "e1").unwrap();

    make_unwritable(&vault);

    assert!(vault.delete(&id, &owner).is_err());
    assert!(vault.get(&id, &owner).is_ok());

    assert!(vault.delete_all(&owner).is_err());
    assert_eq!(vault.list(&owner).unwrap().len(), 1);

    assert!(vault.remove_account(&owner).is_err());
    assert!(vault.account(&owner).is_ok());

    assert!(vault.create_account("bob@example.com", "h").is_err());
    assert!(vault.resolve_owner("bob@example.com").is_err());
}

#[test]
fn correct_password_verifies_on_unwritable_vault() {
    let dir = TempDir::new().unwrap();
    let mut vault = new_vault(&dir);
    let hash = hash_master_password("correct-horse").unwrap();
    let owner = vault.create_account("alice@example.com", &hash).unwrap();

    make_unwritable(&vault);

    assert!(vault.verify_master_password(&owner, "correct-horse").unwrap());
    assert!(!vault.verify_master_password(&owner, "wrong-horse").unwrap());
    // The access stamp was not persisted, so it is not kept either.
    assert!(vault.account(&owner).unwrap().last_access.is_none());
}
