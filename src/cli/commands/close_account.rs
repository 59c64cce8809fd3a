//! `sitevault close-account` — delete an account and all of its passwords.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{prompt_master_password, require_user, resolve_owner, Cli, Context};
use crate::errors::{Result, VaultError};

/// Execute the `close-account` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;
    let email = require_user(cli)?.trim();

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Close account {email} and delete every stored password? This cannot be undone"
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let master = prompt_master_password()?;
    let removed = service.close_account(&owner, &master)?;

    #[cfg(feature = "audit-log")]
    if let Some(audit) = crate::audit::AuditLog::open(&ctx.vault_dir) {
        if let Err(e) = audit.purge_owner(&owner) {
            output::warning(&format!("Could not purge audit entries: {e}"));
        }
    }

    output::success(&format!(
        "Closed account {email} ({removed} password{} deleted)",
        if removed == 1 { "" } else { "s" }
    ));

    Ok(())
}
