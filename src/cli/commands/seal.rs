//! `sitevault seal` / `sitevault unseal` — envelope encryption without a
//! vault.
//!
//! Useful for producing or checking tokens by hand.  No account is
//! involved and nothing is read from or written to disk.

use crate::cli::{prompt_master_password, read_secret_value, Cli, Context};
use crate::errors::Result;

/// Execute the `seal` command: print a fresh envelope for `value`.
pub fn execute(cli: &Cli, value: Option<&str>) -> Result<()> {
    let codec = Context::load(cli)?.settings.codec()?;

    let plaintext = read_secret_value(value, "Value to seal")?;
    let master = prompt_master_password()?;

    println!("{}", codec.encrypt(&plaintext, &master)?);
    Ok(())
}

/// Execute the `unseal` command: print the plaintext inside `token`.
pub fn unseal(cli: &Cli, token: &str) -> Result<()> {
    let codec = Context::load(cli)?.settings.codec()?;
    let master = prompt_master_password()?;

    let plaintext = zeroize::Zeroizing::new(codec.decrypt(token.trim(), &master)?);
    println!("{}", plaintext.as_str());
    Ok(())
}
