//! Block cipher primitives behind the envelope codec.
//!
//! - AES-256-CBC with PKCS#7 padding: the legacy envelope cipher.  It has
//!   no authentication tag, so padding validation is the only integrity
//!   check on decrypt.
//! - AES-256-GCM: the authenticated cipher behind `v2` envelopes.
//!
//! Both take the IV/nonce from the caller, since the codec writes it
//! into the token as a separate field.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::errors::{Result, VaultError};

/// AES block size, which is also the CBC IV length.
pub const IV_LEN: usize = 16;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypt `plaintext` under a 32-byte `key` with AES-256-CBC.
///
/// The output is always a non-empty multiple of the block size, even for
/// an empty plaintext (one full block of padding).
pub fn encrypt_cbc(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt AES-256-CBC ciphertext and strip the PKCS#7 padding.
///
/// A bad padding block is the only signal of a wrong key here, and it
/// is reported exactly like any other failure.
pub fn decrypt_cbc(key: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| VaultError::DecryptionFailed)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)
}

/// Encrypt and authenticate `plaintext` with AES-256-GCM.
///
/// `aad` is authenticated but not encrypted; the codec binds the token
/// header through it.  Returns ciphertext with the 16-byte tag appended.
pub fn encrypt_gcm(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt AES-256-GCM ciphertext and verify its tag against `aad`.
pub fn decrypt_gcm(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::DecryptionFailed)?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| VaultError::DecryptionFailed)
}
