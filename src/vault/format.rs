//! Binary vault file format and checksum verification.
//!
//! A `.svlt` file has this layout:
//!
//! ```text
//! [SVLT: 4 bytes][version: 1 byte][body_len: 4 bytes LE][body JSON][SHA-256: 32 bytes]
//! ```
//!
//! - **Magic** (`SVLT`): identifies the file as a SiteVault vault.
//! - **Version**: format version (currently `1`).
//! - **Body length**: little-endian u32 length of the body JSON.
//! - **Body JSON**: serialized `VaultBody` (accounts and secrets).
//! - **SHA-256**: digest of the body bytes.
//!
//! The digest catches truncation and bit rot.  It is not keyed: each
//! envelope protects its own secret and master hashes are Argon2id.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::record::{Account, SecretRecord};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"SVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the checksum appended to the file.
const CHECKSUM_LEN: usize = 32;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (body_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// VaultBody
// ---------------------------------------------------------------------------

/// Everything persisted in a vault file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultBody {
    #[serde(default)]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub secrets: Vec<SecretRecord>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a vault file to disk **atomically**.
///
/// 1. Serialize the body to JSON.
/// 2. Compute SHA-256 over the body bytes.
/// 3. Write to a temp file in the same directory.
/// 4. Rename temp file over the target path.
pub fn write_vault(path: &Path, body: &VaultBody) -> Result<()> {
    let body_bytes = serde_json::to_vec(body)
        .map_err(|e| VaultError::SerializationError(format!("vault body: {e}")))?;

    let body_len = u32::try_from(body_bytes.len()).map_err(|_| {
        VaultError::SerializationError(format!(
            "body length {} exceeds u32::MAX",
            body_bytes.len()
        ))
    })?;
    let checksum = Sha256::digest(&body_bytes);

    let mut buf = Vec::with_capacity(PREFIX_LEN + body_bytes.len() + CHECKSUM_LEN);
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&body_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&body_bytes); // body JSON
    buf.extend_from_slice(&checksum); // 32 bytes

    // Same directory as the target so the rename stays on one filesystem.
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, &buf)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Read a vault file and verify its checksum before deserializing.
pub fn read_vault(path: &Path) -> Result<VaultBody> {
    if !path.exists() {
        return Err(VaultError::VaultNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    if data.len() < PREFIX_LEN + CHECKSUM_LEN {
        return Err(VaultError::InvalidVaultFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    // --- Parse the fixed-size prefix ---

    if &data[0..4] != MAGIC {
        return Err(VaultError::InvalidVaultFormat(
            "missing SVLT magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(VaultError::InvalidVaultFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let body_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| VaultError::InvalidVaultFormat("bad body length".into()))?,
    );
    let body_len = usize::try_from(body_len_u32).map_err(|_| {
        VaultError::InvalidVaultFormat(format!(
            "body length {body_len_u32} exceeds platform address space"
        ))
    })?;

    let body_end = PREFIX_LEN + body_len;
    if body_end + CHECKSUM_LEN != data.len() {
        return Err(VaultError::InvalidVaultFormat(
            "body length does not match file size".into(),
        ));
    }

    let body_bytes = &data[PREFIX_LEN..body_end];
    let stored = &data[body_end..];

    if Sha256::digest(body_bytes).as_slice() != stored {
        return Err(VaultError::ChecksumMismatch);
    }

    serde_json::from_slice(body_bytes)
        .map_err(|e| VaultError::InvalidVaultFormat(format!("body JSON: {e}")))
}
