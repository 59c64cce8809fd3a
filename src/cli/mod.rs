//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::master_hash::MIN_MASTER_PASSWORD_LEN;
use crate::errors::{Result, VaultError};
use crate::notify::{LogNotifier, NotifierChain};
use crate::ports::OwnerResolver;
use crate::service::VaultService;
use crate::vault::{FileVault, OwnerId};

/// Environment variable consulted before prompting for the master password.
pub const MASTER_PASSWORD_ENV: &str = "SITEVAULT_MASTER_PASSWORD";

/// SiteVault CLI: encrypted per-user password vault.
#[derive(Parser)]
#[command(
    name = "sitevault",
    about = "Encrypted per-user password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Account email to act as
    #[arg(short, long, env = "SITEVAULT_USER", global = true)]
    pub user: Option<String>,

    /// Vault directory (overrides `vault_dir` in .sitevault.toml)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create an account and choose its master password
    Signup,

    /// Encrypt and store a site password
    Add {
        /// Site the password belongs to (e.g. github.com)
        #[arg(short, long)]
        site: String,
        /// Login name on that site
        #[arg(short = 'n', long)]
        username: Option<String>,
        /// Password value (omit for interactive prompt or piped stdin)
        value: Option<String>,
    },

    /// List stored passwords (metadata only)
    List,

    /// Decrypt and show one stored password
    View {
        /// Record id (from `list`)
        id: String,
    },

    /// Decrypt a stored envelope you already hold
    Reveal {
        /// Site the envelope was stored under
        #[arg(short, long)]
        site: String,
        /// Envelope token, exactly as stored
        #[arg(short, long)]
        envelope: String,
    },

    /// Delete a stored password
    Delete {
        /// Record id (from `list`)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check a master password without decrypting anything
    Verify,

    /// Delete the account and every password it stores
    CloseAccount {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Encrypt a value into an envelope token (nothing is stored)
    Seal {
        /// Value to encrypt (omit for interactive prompt or piped stdin)
        value: Option<String>,
    },

    /// Decrypt an envelope token (nothing is read from the vault)
    Unseal {
        /// Envelope token
        token: String,
    },

    /// View the audit log for the current account
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Show version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved per-invocation context: where the vault lives and how it is
/// configured.
pub struct Context {
    pub settings: Settings,
    pub vault_dir: PathBuf,
    pub vault_path: PathBuf,
}

impl Context {
    /// Load `.sitevault.toml` from the working directory and apply CLI
    /// overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut settings = Settings::load(&cwd)?;
        if let Some(dir) = &cli.vault_dir {
            settings.vault_dir = dir.clone();
            settings.validate()?;
        }

        let vault_dir = settings.vault_dir_path(&cwd);
        let vault_path = settings.vault_path(&cwd);
        Ok(Self {
            settings,
            vault_dir,
            vault_path,
        })
    }

    /// Build the notifier chain the settings ask for.
    pub fn notifier(&self) -> NotifierChain {
        if !self.settings.notify_on_access {
            return NotifierChain::new();
        }

        let chain = NotifierChain::new().with(LogNotifier);
        #[cfg(feature = "audit-log")]
        let chain = chain.with(crate::notify::AuditNotifier::new(&self.vault_dir));
        chain
    }

    /// Open the vault and wrap it in a service.
    pub fn service(&self) -> Result<VaultService<FileVault, NotifierChain>> {
        let store = FileVault::open(&self.vault_path)?;
        Ok(VaultService::new(
            store,
            self.settings.codec()?,
            self.notifier(),
        ))
    }

    /// Record an operation in the audit log, ignoring any failure.
    pub fn log_audit(&self, op: &str, owner: &OwnerId, site: Option<&str>, details: Option<&str>) {
        #[cfg(feature = "audit-log")]
        if let Some(audit) = crate::audit::AuditLog::open(&self.vault_dir) {
            audit.log(op, owner, site, details);
        }

        #[cfg(not(feature = "audit-log"))]
        let _ = (op, owner, site, details);
    }
}

/// The `--user` credential, or an `Unauthorized` error telling how to set it.
pub fn require_user(cli: &Cli) -> Result<&str> {
    cli.user.as_deref().filter(|u| !u.trim().is_empty()).ok_or_else(|| {
        VaultError::Unauthorized("no account selected — pass --user or set SITEVAULT_USER".into())
    })
}

/// Resolve the acting owner from `--user`.
pub fn resolve_owner(cli: &Cli, resolver: &impl OwnerResolver) -> Result<OwnerId> {
    resolver.resolve_owner(require_user(cli)?)
}

/// Get the master password, trying in order:
/// 1. `SITEVAULT_MASTER_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_master_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(MASTER_PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `signup`).
///
/// Also respects `SITEVAULT_MASTER_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_master_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(MASTER_PASSWORD_ENV) {
        if !pw.is_empty() {
            if pw.chars().count() < MIN_MASTER_PASSWORD_LEN {
                return Err(VaultError::InvalidInput(format!(
                    "master password must be at least {MIN_MASTER_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_MASTER_PASSWORD_LEN {
            output::warning(&format!(
                "Master password must be at least {MIN_MASTER_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Read a secret value from one of three sources:
/// 1. the command line (warns about shell history)
/// 2. piped stdin
/// 3. an interactive hidden prompt
pub fn read_secret_value(value: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut *buf)?;
        return Ok(Zeroizing::new(
            buf.trim_end_matches(['\r', '\n']).to_string(),
        ));
    }

    let v = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(v))
}
