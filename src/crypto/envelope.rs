//! The envelope codec: plaintext + master password in, self-contained
//! token out, and back again.
//!
//! Every `encrypt` call derives a key under a fresh salt and encrypts
//! under a fresh IV, so the same secret never produces the same token
//! twice.  `decrypt` needs nothing but the token and the password.
//!
//! All decrypt-side problems (unparseable token, wrong password, padding
//! or tag mismatch, non-UTF-8 plaintext) collapse into
//! `VaultError::DecryptionFailed`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroize;

use super::encryption::{decrypt_cbc, decrypt_gcm, encrypt_cbc, encrypt_gcm, IV_LEN, NONCE_LEN};
use super::kdf::{random_bytes, KeyDeriver, Pbkdf2Params};
use super::token::{AeadToken, EnvelopeToken, LegacyToken};
use crate::errors::{Result, VaultError};

/// Which token layout `encrypt` writes.  `decrypt` always reads both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeFormat {
    /// `<iv>:<ciphertext>:<salt>` with AES-256-CBC.
    #[default]
    LegacyCbc,
    /// `v2:<iterations>:<nonce>:<ciphertext>:<salt>` with AES-256-GCM.
    AeadV2,
}

impl EnvelopeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeFormat::LegacyCbc => "legacy-cbc",
            EnvelopeFormat::AeadV2 => "aead-v2",
        }
    }
}

/// Stateless encrypt/decrypt front end over a `KeyDeriver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec {
    deriver: KeyDeriver,
    format: EnvelopeFormat,
}

impl EnvelopeCodec {
    pub fn new(deriver: KeyDeriver, format: EnvelopeFormat) -> Self {
        Self { deriver, format }
    }

    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    pub fn deriver(&self) -> &KeyDeriver {
        &self.deriver
    }

    /// Encrypt `plaintext` under a key derived from `master_password`.
    ///
    /// Errors here are fatal misconfiguration, never a user mistake.
    pub fn encrypt(&self, plaintext: &str, master_password: &str) -> Result<String> {
        let (key, salt) = self.deriver.derive(master_password, None);

        let token = match self.format {
            EnvelopeFormat::LegacyCbc => {
                let iv = random_bytes::<IV_LEN>();
                let ciphertext = encrypt_cbc(key.as_bytes(), &iv, plaintext.as_bytes())?;
                EnvelopeToken::Legacy(LegacyToken {
                    iv,
                    ciphertext,
                    salt,
                })
            }
            EnvelopeFormat::AeadV2 => {
                let iterations = self.deriver.params().iterations;
                let nonce = random_bytes::<NONCE_LEN>();
                let aad = AeadToken::associated_data(iterations, &salt);
                let ciphertext = encrypt_gcm(key.as_bytes(), &nonce, plaintext.as_bytes(), &aad)?;
                EnvelopeToken::Aead(AeadToken {
                    iterations,
                    nonce,
                    ciphertext,
                    salt,
                })
            }
        };

        trace!(
            format = self.format.as_str(),
            plaintext_len = plaintext.len(),
            "sealed envelope"
        );
        Ok(token.to_string())
    }

    /// Recover the plaintext from `token` with `master_password`.
    pub fn decrypt(&self, token: &str, master_password: &str) -> Result<String> {
        let parsed: EnvelopeToken = token.parse().map_err(|e| {
            debug!(error = %e, "rejecting unparseable envelope");
            VaultError::DecryptionFailed
        })?;

        let mut plaintext = match parsed {
            EnvelopeToken::Legacy(t) => {
                let key = self.deriver.derive_with_salt(master_password, &t.salt);
                decrypt_cbc(key.as_bytes(), &t.iv, &t.ciphertext)?
            }
            EnvelopeToken::Aead(t) => {
                // v2 tokens carry their own cost parameter.
                let deriver = KeyDeriver::new(Pbkdf2Params {
                    iterations: t.iterations,
                })?;
                let key = deriver.derive_with_salt(master_password, &t.salt);
                let aad = AeadToken::associated_data(t.iterations, &t.salt);
                decrypt_gcm(key.as_bytes(), &t.nonce, &t.ciphertext, &aad)?
            }
        };

        match std::str::from_utf8(&plaintext) {
            Ok(s) => {
                let out = s.to_owned();
                plaintext.zeroize();
                Ok(out)
            }
            Err(_) => {
                plaintext.zeroize();
                Err(VaultError::DecryptionFailed)
            }
        }
    }
}
