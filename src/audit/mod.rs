//! Audit log — SQLite-based record of vault operations and access
//! notifications.
//!
//! Stores one row per operation (signup, add, view, delete, ...) in a
//! local SQLite database at `<vault_dir>/audit.db`.  Rows never contain
//! secret values or master passwords.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{Result, VaultError};
use crate::vault::OwnerId;

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub owner_id: String,
    pub site: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `<vault_dir>/audit.db`.
    ///
    /// Returns `None` if the database can't be opened — callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(vault_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(vault_dir);
        let conn = Connection::open(&db_path).ok()?;

        // Owner-only, like the vault file itself.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                owner_id    TEXT NOT NULL,
                site        TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation. Fire-and-forget — errors are silently ignored.
    pub fn log(&self, operation: &str, owner: &OwnerId, site: Option<&str>, details: Option<&str>) {
        let _ = self.try_log(operation, owner, site, details);
    }

    /// Record an operation, reporting failures to the caller.
    pub fn try_log(
        &self,
        operation: &str,
        owner: &OwnerId,
        site: Option<&str>,
        details: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO audit_log (timestamp, operation, owner_id, site, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![now, operation, owner.as_str(), site, details],
            )
            .map_err(|e| VaultError::AuditError(format!("insert: {e}")))?;
        Ok(())
    }

    /// Query recent audit entries for one owner.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries newer than this timestamp.
    pub fn query(
        &self,
        owner: &OwnerId,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let since_str = since.map(|ts| ts.to_rfc3339());

        // `?2 IS NULL` lets one statement serve both the filtered and
        // unfiltered query.
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, owner_id, site, details
                 FROM audit_log
                 WHERE owner_id = ?1 AND (?2 IS NULL OR timestamp >= ?2)
                 ORDER BY id DESC
                 LIMIT ?3",
            )
            .map_err(|e| VaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(
                rusqlite::params![owner.as_str(), since_str, limit_i64],
                |row| {
                    let ts_str: String = row.get(1)?;
                    let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                    Ok(AuditEntry {
                        id: row.get(0)?,
                        timestamp,
                        operation: row.get(2)?,
                        owner_id: row.get(3)?,
                        site: row.get(4)?,
                        details: row.get(5)?,
                    })
                },
            )
            .map_err(|e| VaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| VaultError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }

    /// Remove every entry belonging to `owner` (used when an account is closed).
    pub fn purge_owner(&self, owner: &OwnerId) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM audit_log WHERE owner_id = ?1",
                rusqlite::params![owner.as_str()],
            )
            .map_err(|e| VaultError::AuditError(format!("purge: {e}")))
    }

    /// Return the path to the audit database (for testing/display).
    pub fn db_path(vault_dir: &Path) -> PathBuf {
        vault_dir.join("audit.db")
    }
}
