//! Envelope token wire format.
//!
//! Two layouts are understood:
//!
//! ```text
//! legacy:  <iv_hex>:<ciphertext_hex>:<salt_hex>
//! v2:      v2:<iterations>:<nonce_hex>:<ciphertext_hex>:<salt_hex>
//! ```
//!
//! Hex is accepted in either case and always written lowercase.  Parsing
//! only checks structure; whether the ciphertext actually decrypts is the
//! codec's job.

use std::fmt;
use std::str::FromStr;

use super::encryption::{IV_LEN, NONCE_LEN, TAG_LEN};
use super::kdf::{Salt, SALT_LEN};
use crate::errors::{Result, VaultError};

/// Field separator in every token layout.
const SEPARATOR: char = ':';

/// Leading field of a v2 token.
const V2_TAG: &str = "v2";

/// Upper bound on the iteration count a v2 token may ask for.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// AES-256-CBC envelope: the first (unversioned) format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyToken {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub salt: Salt,
}

/// AES-256-GCM envelope that records its own KDF iteration count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadToken {
    pub iterations: u32,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub salt: Salt,
}

impl AeadToken {
    /// Associated data bound into the GCM tag: everything but the
    /// nonce and ciphertext.
    pub fn associated_data(iterations: u32, salt: &Salt) -> Vec<u8> {
        format!("{V2_TAG}{SEPARATOR}{iterations}{SEPARATOR}{}", salt.to_hex()).into_bytes()
    }
}

/// A parsed envelope token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeToken {
    Legacy(LegacyToken),
    Aead(AeadToken),
}

impl fmt::Display for EnvelopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeToken::Legacy(t) => write!(
                f,
                "{}{SEPARATOR}{}{SEPARATOR}{}",
                hex::encode(t.iv),
                hex::encode(&t.ciphertext),
                t.salt.to_hex()
            ),
            EnvelopeToken::Aead(t) => write!(
                f,
                "{V2_TAG}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
                t.iterations,
                hex::encode(t.nonce),
                hex::encode(&t.ciphertext),
                t.salt.to_hex()
            ),
        }
    }
}

impl FromStr for EnvelopeToken {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(SEPARATOR).collect();

        match fields.as_slice() {
            [iv, ciphertext, salt] => {
                let ciphertext = decode_var("ciphertext", ciphertext)?;
                if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
                    return Err(malformed(format!(
                        "ciphertext must be a non-empty multiple of {IV_LEN} bytes (got {})",
                        ciphertext.len()
                    )));
                }
                Ok(EnvelopeToken::Legacy(LegacyToken {
                    iv: decode_fixed::<IV_LEN>("iv", iv)?,
                    ciphertext,
                    salt: Salt::from_bytes(decode_fixed::<SALT_LEN>("salt", salt)?),
                }))
            }
            [tag, iterations, nonce, ciphertext, salt] if *tag == V2_TAG => {
                let iterations = parse_iterations(iterations)?;
                let ciphertext = decode_var("ciphertext", ciphertext)?;
                if ciphertext.len() < TAG_LEN {
                    return Err(malformed(format!(
                        "ciphertext shorter than the {TAG_LEN}-byte tag"
                    )));
                }
                Ok(EnvelopeToken::Aead(AeadToken {
                    iterations,
                    nonce: decode_fixed::<NONCE_LEN>("nonce", nonce)?,
                    ciphertext,
                    salt: Salt::from_bytes(decode_fixed::<SALT_LEN>("salt", salt)?),
                }))
            }
            other => Err(malformed(format!(
                "expected 3 fields (or 5 for v2), found {}",
                other.len()
            ))),
        }
    }
}

fn malformed(msg: String) -> VaultError {
    VaultError::MalformedEnvelope(msg)
}

fn decode_fixed<const N: usize>(field: &str, text: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)
        .map_err(|e| malformed(format!("{field}: expected {} hex chars: {e}", N * 2)))?;
    Ok(out)
}

fn decode_var(field: &str, text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| malformed(format!("{field}: {e}")))
}

fn parse_iterations(text: &str) -> Result<u32> {
    // Digits only: no sign, no whitespace.
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(format!("iterations: '{text}' is not a number")));
    }
    let n: u32 = text
        .parse()
        .map_err(|e| malformed(format!("iterations: {e}")))?;
    if n == 0 || n > MAX_ITERATIONS {
        return Err(malformed(format!(
            "iterations must be between 1 and {MAX_ITERATIONS} (got {n})"
        )));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV_HEX: &str = "000102030405060708090a0b0c0d0e0f";
    const SALT_HEX: &str = "f0e0d0c0b0a090807060504030201000";
    const CT_HEX: &str = "00112233445566778899aabbccddeeff";

    #[test]
    fn parses_legacy_token() {
        let token: EnvelopeToken = format!("{IV_HEX}:{CT_HEX}:{SALT_HEX}").parse().unwrap();
        match token {
            EnvelopeToken::Legacy(t) => {
                assert_eq!(t.iv[15], 0x0f);
                assert_eq!(t.ciphertext.len(), 16);
                assert_eq!(t.salt.to_hex(), SALT_HEX);
            }
            EnvelopeToken::Aead(_) => panic!("expected legacy token"),
        }
    }

    #[test]
    fn uppercase_hex_is_accepted_and_written_lowercase() {
        let upper = format!("{IV_HEX}:{CT_HEX}:{SALT_HEX}").to_uppercase();
        let token: EnvelopeToken = upper.parse().unwrap();
        assert_eq!(token.to_string(), format!("{IV_HEX}:{CT_HEX}:{SALT_HEX}"));
    }

    #[test]
    fn display_then_parse_is_identity() {
        let text = format!("v2:120000:{}:{CT_HEX}{CT_HEX}:{SALT_HEX}", &IV_HEX[..24]);
        let token: EnvelopeToken = text.parse().unwrap();
        assert_eq!(token.to_string(), text);
    }

    #[test]
    fn wrong_field_count_rejected() {
        for bad in [
            "".to_string(),
            IV_HEX.to_string(),
            format!("{IV_HEX}:{CT_HEX}"),
            format!("{IV_HEX}:{CT_HEX}:{SALT_HEX}:extra"),
        ] {
            let err = bad.parse::<EnvelopeToken>().unwrap_err();
            assert!(matches!(err, VaultError::MalformedEnvelope(_)), "{bad}");
        }
    }

    #[test]
    fn non_hex_rejected() {
        let bad = format!("{IV_HEX}:zz112233445566778899aabbccddeeff:{SALT_HEX}");
        assert!(bad.parse::<EnvelopeToken>().is_err());
    }

    #[test]
    fn truncated_iv_and_salt_rejected() {
        let short_iv = format!("{}:{CT_HEX}:{SALT_HEX}", &IV_HEX[..30]);
        assert!(short_iv.parse::<EnvelopeToken>().is_err());

        let short_salt = format!("{IV_HEX}:{CT_HEX}:{}", &SALT_HEX[..31]);
        assert!(short_salt.parse::<EnvelopeToken>().is_err());
    }

    #[test]
    fn ciphertext_must_be_block_aligned() {
        let odd = format!("{IV_HEX}:{}:{SALT_HEX}", &CT_HEX[..30]);
        assert!(odd.parse::<EnvelopeToken>().is_err());

        let empty = format!("{IV_HEX}::{SALT_HEX}");
        assert!(empty.parse::<EnvelopeToken>().is_err());
    }

    #[test]
    fn v2_iteration_bounds() {
        let nonce = &IV_HEX[..24];
        for iters in ["0", "10000001", "-5", "+5", " 5", "abc", ""] {
            let text = format!("v2:{iters}:{nonce}:{CT_HEX}:{SALT_HEX}");
            assert!(text.parse::<EnvelopeToken>().is_err(), "{iters}");
        }
    }

    #[test]
    fn five_fields_without_v2_tag_rejected() {
        let text = format!("v3:1000:{}:{CT_HEX}:{SALT_HEX}", &IV_HEX[..24]);
        assert!(text.parse::<EnvelopeToken>().is_err());
    }

    #[test]
    fn aad_covers_iterations_and_salt() {
        let salt = Salt::from_bytes([1u8; SALT_LEN]);
        assert_ne!(
            AeadToken::associated_data(1000, &salt),
            AeadToken::associated_data(1001, &salt)
        );
    }
}
