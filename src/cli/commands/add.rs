//! `sitevault add` — encrypt and store a site password.

use crate::cli::output;
use crate::cli::{prompt_master_password, read_secret_value, resolve_owner, Cli, Context};
use crate::errors::Result;

/// Execute the `add` command.
pub fn execute(cli: &Cli, site: &str, username: Option<&str>, value: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    let secret = read_secret_value(value, &format!("Password for {}", site.trim()))?;
    let master = prompt_master_password()?;

    let id = service.add_secret(&owner, site, username, &secret, &master)?;

    ctx.log_audit("add", &owner, Some(site.trim()), None);
    output::success(&format!("Stored password for '{}' (id {id})", site.trim()));

    Ok(())
}
