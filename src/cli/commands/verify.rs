//! `sitevault verify` — check a master password against the stored hash.

use crate::cli::output;
use crate::cli::{prompt_master_password, resolve_owner, Cli, Context};
use crate::errors::Result;

/// Execute the `verify` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    let master = prompt_master_password()?;
    service.verify_master_password(&owner, &master)?;

    output::success("Master password is correct.");
    Ok(())
}
