//! `sitevault reveal` — decrypt an envelope the caller already holds.
//!
//! The envelope must match one of the account's records for the given
//! site; a wrong master password shows up as a decryption failure.

use crate::cli::{prompt_master_password, resolve_owner, Cli, Context};
use crate::errors::Result;

/// Execute the `reveal` command.
pub fn execute(cli: &Cli, site: &str, envelope: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    let master = prompt_master_password()?;
    let revealed = service.reveal_envelope(&owner, site, envelope.trim(), &master)?;

    ctx.log_audit("reveal", &owner, Some(&revealed.site), None);
    println!("{}", revealed.plaintext.as_str());

    Ok(())
}
