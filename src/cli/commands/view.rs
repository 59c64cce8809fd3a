//! `sitevault view` — decrypt and print one stored password.

use crate::cli::{prompt_master_password, resolve_owner, Cli, Context};
use crate::errors::Result;
use crate::vault::RecordId;

/// Execute the `view` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    let master = prompt_master_password()?;
    let revealed = service.view_secret(&owner, &RecordId::from(id), &master)?;

    ctx.log_audit("view", &owner, Some(&revealed.site), None);

    // Bare value on stdout so it can be piped.
    println!("{}", revealed.plaintext.as_str());

    Ok(())
}
