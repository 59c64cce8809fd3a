//! `sitevault version` — display version information.

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("sitevault {current}");
    Ok(())
}
