// Keysafe — SQLite Audit Sink
//
// Appends to the `secrets_logs` table in the same database as the secrets.
// The table has no foreign key to `secrets`, so history outlives deletion.

use rusqlite::params;

use crate::store::{parse_timestamp, Database};

use super::{AuditEntry, AuditError, AuditSink};

pub struct SqliteAuditSink<'a> {
    db: &'a Database,
}

impl<'a> SqliteAuditSink<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Read back the history of one key, oldest first.
    pub fn entries_for(&self, key: &str) -> Result<Vec<AuditEntry>, AuditError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT action, key_name, user_id, ip_address, created_at
             FROM secrets_logs WHERE key_name = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query(params![key])?;
        let entries = Self::collect(rows)?;
        Ok(entries)
    }

    /// Read back the most recent `limit` entries across all keys, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.db.conn().prepare(
            "SELECT action, key_name, user_id, ip_address, created_at FROM (
                 SELECT id, action, key_name, user_id, ip_address, created_at
                 FROM secrets_logs ORDER BY id DESC LIMIT ?1
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query(params![limit])?;
        let entries = Self::collect(rows)?;
        Ok(entries)
    }

    fn collect(mut rows: rusqlite::Rows<'_>) -> Result<Vec<AuditEntry>, AuditError> {
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let action: String = row.get(0)?;
            let created_at: String = row.get(4)?;
            entries.push(AuditEntry {
                action: action.parse()?,
                key: row.get(1)?,
                actor: row.get(2)?,
                ip_address: row.get(3)?,
                timestamp: parse_timestamp(&created_at),
            });
        }
        Ok(entries)
    }
}

impl<'a> AuditSink for SqliteAuditSink<'a> {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.db.conn().execute(
            "INSERT INTO secrets_logs (action, key_name, user_id, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.action.as_str(),
                entry.key,
                entry.actor,
                entry.ip_address,
                entry.timestamp.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            action = %entry.action,
            key = %entry.key,
            "Audit log entry recorded"
        );

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
