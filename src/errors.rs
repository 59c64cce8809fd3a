use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in SiteVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The single failure signal for every decrypt problem: wrong master
    /// password, corrupted ciphertext, or a malformed envelope.
    #[error("Decryption failed — wrong master password or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashFailed(String),

    // --- Account errors ---
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid master password")]
    InvalidMasterPassword,

    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    #[error("An account for '{0}' already exists")]
    AccountAlreadyExists(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Checksum verification failed — vault file is corrupted")]
    ChecksumMismatch,

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),
}

impl VaultError {
    /// `true` for the uniform "cannot decrypt" outcome.
    ///
    /// Everything else coming out of the codec is a fatal error that the
    /// caller should report as a generic server-side failure.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, VaultError::DecryptionFailed)
    }

    /// Primitive failures inside the crypto layer.  These point at a broken
    /// build or environment, not at anything the user typed.
    pub fn is_internal_crypto_failure(&self) -> bool {
        matches!(
            self,
            VaultError::EncryptionFailed(_)
                | VaultError::KeyDerivationFailed(_)
                | VaultError::MalformedEnvelope(_)
                | VaultError::PasswordHashFailed(_)
        )
    }

    /// Text safe to show the user.  Internal crypto failures are reported
    /// generically; the detail belongs in the debug log.
    pub fn user_message(&self) -> String {
        if self.is_internal_crypto_failure() {
            "Internal error — the operation could not be completed (run with -v for details)"
                .to_string()
        } else {
            self.to_string()
        }
    }
}

/// Convenience type alias for SiteVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
