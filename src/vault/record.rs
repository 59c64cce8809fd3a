//! Records kept by the vault: accounts and the secrets they own.
//!
//! Secrets hold only plaintext metadata (site, username) next to the
//! opaque envelope string; nothing in this module can read an envelope.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::kdf::random_bytes;

/// Length of generated ids in bytes (rendered as 24 hex chars).
const ID_LEN: usize = 12;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(hex::encode(random_bytes::<ID_LEN>()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.trim().to_ascii_lowercase())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hex_id!(
    /// Identifier of the account that owns a secret.
    OwnerId
);

hex_id!(
    /// Identifier of a single stored secret.
    RecordId
);

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: OwnerId,

    /// Login identifier, stored lowercased.
    pub email: String,

    /// Argon2id PHC string of the master password.
    pub master_password_hash: String,

    pub created_at: DateTime<Utc>,

    /// Last time the master password was verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access: Option<DateTime<Utc>>,
}

/// One stored credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: RecordId,
    pub owner_id: OwnerId,

    /// Site the credential belongs to (e.g. "github.com").
    pub site: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Encoded envelope token, exactly as the codec produced it.
    pub envelope: String,

    pub created_at: DateTime<Utc>,
}

/// Secret metadata without the envelope, for listings.
#[derive(Debug, Clone)]
pub struct SecretMetadata {
    pub id: RecordId,
    pub site: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&SecretRecord> for SecretMetadata {
    fn from(r: &SecretRecord) -> Self {
        Self {
            id: r.id.clone(),
            site: r.site.clone(),
            username: r.username.clone(),
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_24_hex_chars() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), 24);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(id, RecordId::generate());
    }

    #[test]
    fn ids_from_user_input_are_normalized() {
        assert_eq!(OwnerId::from(" ABCdef "), OwnerId::from("abcdef"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = OwnerId::from("00ff");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"00ff\"");
    }
}
