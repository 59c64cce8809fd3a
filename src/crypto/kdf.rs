//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is deliberately high so each derivation costs
//! tens of milliseconds, which slows down brute force against a stolen
//! envelope.  Parameters are injected via `Pbkdf2Params` (loaded from
//! `.sitevault.toml` or defaults) so tests can run with cheap settings.

use std::fmt;

use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Configurable PBKDF2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Params {
    /// Number of HMAC-SHA256 rounds (default: 100 000).
    pub iterations: u32,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// A random per-secret salt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Generate a fresh cryptographically random salt.
    pub fn generate() -> Self {
        Self(generate_salt())
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// Lowercase hex text of the salt, as written into envelopes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

/// A 32-byte symmetric key that zeroes its memory when dropped.
///
/// Only ever lives for the duration of one encrypt or decrypt call.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Access the raw key bytes (to hand to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Stretches a master password into a symmetric key.
///
/// Holds no state besides its parameters, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    params: Pbkdf2Params,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self {
            params: Pbkdf2Params::default(),
        }
    }
}

impl KeyDeriver {
    /// Build a deriver with explicit parameters.
    ///
    /// Any positive iteration count is accepted here; the production floor
    /// is enforced by `Settings::validate`.
    pub fn new(params: Pbkdf2Params) -> Result<Self> {
        if params.iterations < 1 {
            return Err(VaultError::KeyDerivationFailed(
                "PBKDF2 iterations must be at least 1".into(),
            ));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> Pbkdf2Params {
        self.params
    }

    /// Derive a key, generating a fresh salt when none is supplied.
    ///
    /// Returns the salt that was actually used alongside the key.
    pub fn derive(&self, master_password: &str, salt: Option<&Salt>) -> (DerivedKey, Salt) {
        let salt = salt.copied().unwrap_or_else(Salt::generate);
        let key = self.derive_with_salt(master_password, &salt);
        (key, salt)
    }

    /// Derive the key for a known salt.
    ///
    /// The same password + salt + params always produce the same key.
    pub fn derive_with_salt(&self, master_password: &str, salt: &Salt) -> DerivedKey {
        // The salt enters PBKDF2 as its hex text, not its raw bytes.
        // Envelopes written by earlier releases depend on this.
        let mut salt_text = salt.to_hex();
        let mut bytes = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            master_password.as_bytes(),
            salt_text.as_bytes(),
            self.params.iterations,
            &mut bytes,
        );
        salt_text.zeroize();

        let key = DerivedKey { bytes };
        bytes.zeroize();
        key
    }
}

/// Fill a fixed-size buffer from the thread-local CSPRNG.
pub(crate) fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    random_bytes::<SALT_LEN>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KeyDeriver {
        KeyDeriver::new(Pbkdf2Params { iterations: 1_000 }).unwrap()
    }

    #[test]
    fn zero_iterations_rejected() {
        let err = KeyDeriver::new(Pbkdf2Params { iterations: 0 }).unwrap_err();
        assert!(matches!(err, VaultError::KeyDerivationFailed(_)));
    }

    #[test]
    fn default_params_meet_floor() {
        assert!(KeyDeriver::default().params().iterations >= 100_000);
    }

    #[test]
    fn derive_without_salt_generates_one() {
        let kdf = fast();
        let (_, s1) = kdf.derive("pw", None);
        let (_, s2) = kdf.derive("pw", None);
        assert_ne!(s1, s2);
    }

    #[test]
    fn derive_with_supplied_salt_returns_it() {
        let kdf = fast();
        let salt = Salt::from_bytes([7u8; SALT_LEN]);
        let (_, used) = kdf.derive("pw", Some(&salt));
        assert_eq!(used, salt);
    }

    #[test]
    fn matches_pbkdf2_over_hex_salt_text() {
        let kdf = fast();
        let salt = Salt::from_bytes([0xabu8; SALT_LEN]);
        let key = kdf.derive_with_salt("master", &salt);

        let mut expected = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            b"master",
            "abababababababababababababababab".as_bytes(),
            1_000,
            &mut expected,
        );
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn iteration_count_changes_key() {
        let salt = Salt::generate();
        let a = KeyDeriver::new(Pbkdf2Params { iterations: 1_000 }).unwrap();
        let b = KeyDeriver::new(Pbkdf2Params { iterations: 1_001 }).unwrap();
        assert_ne!(
            a.derive_with_salt("pw", &salt).as_bytes(),
            b.derive_with_salt("pw", &salt).as_bytes()
        );
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = fast().derive_with_salt("pw", &Salt::generate());
        assert_eq!(format!("{key:?}"), "DerivedKey(<redacted>)");
    }
}
