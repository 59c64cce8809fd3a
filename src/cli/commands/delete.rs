//! `sitevault delete` — remove a stored password.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{resolve_owner, Cli, Context};
use crate::errors::{Result, VaultError};
use crate::ports::SecretStore;
use crate::vault::RecordId;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    // Look the record up first so the prompt can name the site.
    let record_id = RecordId::from(id);
    let record = service.store().get(&record_id, &owner)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete password for '{}'?", record.site))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    service.delete_secret(&owner, &record_id)?;

    ctx.log_audit("delete", &owner, Some(&record.site), None);
    output::success(&format!("Deleted password for '{}'", record.site));

    Ok(())
}
