//! `sitevault list` — show stored passwords without decrypting them.

use crate::cli::output;
use crate::cli::{resolve_owner, Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    // Metadata only; no master password needed.
    let secrets = service.list_secrets(&owner)?;
    output::print_secrets_table(&secrets);

    Ok(())
}
