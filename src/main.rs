use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sitevault::cli::commands;
use sitevault::cli::output;
use sitevault::cli::{Cli, Commands};
use sitevault::errors::VaultError;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("SITEVAULT_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("sitevault=debug")
        } else {
            EnvFilter::new("sitevault=warn")
        }
    });

    // stdout carries decrypted values and tokens; keep logs off it.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Signup => commands::signup::execute(&cli),
        Commands::Add {
            ref site,
            ref username,
            ref value,
        } => commands::add::execute(&cli, site, username.as_deref(), value.as_deref()),
        Commands::List => commands::list::execute(&cli),
        Commands::View { ref id } => commands::view::execute(&cli, id),
        Commands::Reveal {
            ref site,
            ref envelope,
        } => commands::reveal::execute(&cli, site, envelope),
        Commands::Delete { ref id, force } => commands::delete::execute(&cli, id, force),
        Commands::Verify => commands::verify::execute(&cli),
        Commands::CloseAccount { force } => commands::close_account::execute(&cli, force),
        Commands::Seal { ref value } => commands::seal::execute(&cli, value.as_deref()),
        Commands::Unseal { ref token } => commands::seal::unseal(&cli, token),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        if e.is_internal_crypto_failure() {
            tracing::debug!(error = %e, "internal failure");
        }
        output::error(&e.user_message());
        match e {
            VaultError::VaultNotFound(_) | VaultError::AccountNotFound(_) => {
                output::tip("run: sitevault signup --user <EMAIL>");
            }
            VaultError::Unauthorized(_) => output::tip("set SITEVAULT_USER or pass --user"),
            _ => {}
        }
        std::process::exit(1);
    }
}
