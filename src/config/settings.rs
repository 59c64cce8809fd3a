use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Pbkdf2Params, DEFAULT_ITERATIONS};
use crate::crypto::token::MAX_ITERATIONS;
use crate::crypto::{EnvelopeCodec, EnvelopeFormat, KeyDeriver};
use crate::errors::{Result, VaultError};

/// Lowest PBKDF2 iteration count a config file may select.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Project-level configuration, loaded from `.sitevault.toml`.
///
/// Every field has a sensible default so SiteVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the vault file and
    /// audit database.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// PBKDF2-HMAC-SHA256 iteration count (default: 100 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Token layout written for new secrets (default: legacy-cbc).
    #[serde(default)]
    pub envelope_format: EnvelopeFormat,

    /// Record an audit notification whenever a secret is decrypted.
    #[serde(default = "default_notify_on_access")]
    pub notify_on_access: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".sitevault".to_string()
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_notify_on_access() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            envelope_format: EnvelopeFormat::default(),
            notify_on_access: default_notify_on_access(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".sitevault.toml";

    /// Name of the vault file inside `vault_dir`.
    const VAULT_FILE: &'static str = "vault.svlt";

    /// Load settings from `<project_dir>/.sitevault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or fails validation, an
    /// error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations that would weaken key derivation or make it
    /// unreasonably slow.
    pub fn validate(&self) -> Result<()> {
        if self.pbkdf2_iterations < MIN_ITERATIONS {
            return Err(VaultError::ConfigError(format!(
                "pbkdf2_iterations must be at least {MIN_ITERATIONS} (got {})",
                self.pbkdf2_iterations
            )));
        }
        if self.pbkdf2_iterations > MAX_ITERATIONS {
            return Err(VaultError::ConfigError(format!(
                "pbkdf2_iterations cannot exceed {MAX_ITERATIONS} (got {})",
                self.pbkdf2_iterations
            )));
        }
        if self.vault_dir.trim().is_empty() {
            return Err(VaultError::ConfigError("vault_dir cannot be empty".into()));
        }
        Ok(())
    }

    /// Full path to the vault directory.
    pub fn vault_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Build the full path to the vault file.
    ///
    /// Example: `project_dir/.sitevault/vault.svlt`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_dir_path(project_dir).join(Self::VAULT_FILE)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn pbkdf2_params(&self) -> Pbkdf2Params {
        Pbkdf2Params {
            iterations: self.pbkdf2_iterations,
        }
    }

    /// Build the envelope codec these settings describe.
    pub fn codec(&self) -> Result<EnvelopeCodec> {
        let deriver = KeyDeriver::new(self.pbkdf2_params())?;
        Ok(EnvelopeCodec::new(deriver, self.envelope_format))
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_dir, ".sitevault");
        assert_eq!(s.pbkdf2_iterations, 100_000);
        assert_eq!(s.envelope_format, EnvelopeFormat::LegacyCbc);
        assert!(s.notify_on_access);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.pbkdf2_iterations, 100_000);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_dir = "secrets"
pbkdf2_iterations = 250000
envelope_format = "aead-v2"
notify_on_access = false
"#;
        fs::write(tmp.path().join(".sitevault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "secrets");
        assert_eq!(settings.pbkdf2_iterations, 250_000);
        assert_eq!(settings.envelope_format, EnvelopeFormat::AeadV2);
        assert!(!settings.notify_on_access);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".sitevault.toml"), "vault_dir = \"v\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "v");
        assert_eq!(settings.pbkdf2_iterations, 100_000);
        assert_eq!(settings.envelope_format, EnvelopeFormat::LegacyCbc);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".sitevault.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_unknown_envelope_format() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".sitevault.toml"),
            "envelope_format = \"rot13\"\n",
        )
        .unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn weak_iteration_count_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".sitevault.toml"),
            "pbkdf2_iterations = 1000\n",
        )
        .unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("at least 100000"));
    }

    #[test]
    fn excessive_iteration_count_rejected() {
        let s = Settings {
            pbkdf2_iterations: MAX_ITERATIONS + 1,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn vault_path_builds_correct_path() {
        let s = Settings::default();
        let project = Path::new("/home/user/project");
        assert_eq!(
            s.vault_path(project),
            PathBuf::from("/home/user/project/.sitevault/vault.svlt")
        );
    }

    #[test]
    fn codec_uses_configured_format() {
        let s = Settings {
            envelope_format: EnvelopeFormat::AeadV2,
            ..Settings::default()
        };
        let codec = s.codec().unwrap();
        assert_eq!(codec.format(), EnvelopeFormat::AeadV2);
        assert_eq!(codec.deriver().params().iterations, 100_000);
    }
}
