//! `sitevault signup` — create an account and set its master password.

use crate::cli::output;
use crate::cli::{prompt_new_master_password, require_user, Cli, Context};
use crate::errors::Result;
use crate::service::VaultService;
use crate::vault::FileVault;

/// Execute the `signup` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let email = require_user(cli)?;
    let ctx = Context::load(cli)?;

    let fresh = !ctx.vault_path.exists();
    let store = FileVault::open_or_create(&ctx.vault_path)?;

    let password = prompt_new_master_password()?;

    let mut service = VaultService::new(store, ctx.settings.codec()?, ctx.notifier());
    let owner = service.register(email, &password)?;

    ctx.log_audit("signup", &owner, None, None);

    if fresh {
        output::info(&format!("Created vault at {}", ctx.vault_path.display()));
    }
    output::success(&format!("Account created for {}", email.trim()));
    output::tip("Run `sitevault add --site <SITE>` to store your first password.");

    Ok(())
}
