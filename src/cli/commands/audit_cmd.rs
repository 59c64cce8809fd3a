//! `sitevault audit` — display the audit log for the current account.
//!
//! Usage:
//!   sitevault audit               # show last 50 entries
//!   sitevault audit --last 20     # show last 20
//!   sitevault audit --since 7d    # entries from last 7 days

use chrono::{DateTime, Utc};

use crate::cli::Cli;
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::cli::{output, resolve_owner, Context};

    let ctx = Context::load(cli)?;
    let service = ctx.service()?;
    let owner = resolve_owner(cli, service.store())?;

    let audit = AuditLog::open(&ctx.vault_dir)
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(&owner, last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, since: Option<&str>) -> Result<()> {
    since.map(parse_duration).transpose()?;
    Err(VaultError::CommandFailed(
        "this build of sitevault has no audit log (enable the `audit-log` feature)".into(),
    ))
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, 'd')
    } else if let Some(s) = input.strip_suffix('h') {
        (s, 'h')
    } else if let Some(s) = input.strip_suffix('m') {
        (s, 'm')
    } else {
        return Err(VaultError::InvalidInput(format!(
            "invalid duration '{input}' — use format like 7d, 24h, or 30m"
        )));
    };

    let num: i64 = num_str
        .parse()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| {
            VaultError::InvalidInput(format!(
                "invalid duration '{input}' — number part is not valid"
            ))
        })?;

    let duration = match unit {
        'd' => chrono::Duration::try_days(num),
        'h' => chrono::Duration::try_hours(num),
        _ => chrono::Duration::try_minutes(num),
    }
    .ok_or_else(|| VaultError::InvalidInput(format!("duration '{input}' is too large")))?;

    Ok(Utc::now() - duration)
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Site", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.site.clone().unwrap_or_else(|| "-".to_string()),
            entry.details.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "signup" => style(op).green().to_string(),
        "add" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "view" | "reveal" => style(op).yellow().to_string(),
        "notify" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
