// Keysafe — Record Store Repository
//
// Durable key → ciphertext persistence. The store never sees plaintext.
// Uniqueness is delegated to the `key_name` UNIQUE index: `insert` does not
// check-then-write, it writes and maps the constraint violation to
// `StoreError::Conflict`, so two racing inserts yield one winner.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::db::Database;
use super::models::{parse_timestamp, RecordMeta};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over secret record persistence.
pub trait RecordStore {
    /// Create a record. Fails with `Conflict` if the key already exists.
    fn insert(&self, key: &str, encrypted_value: &str) -> Result<RecordMeta, StoreError>;

    /// Replace the value of an existing record. Returns false if the key is absent.
    fn update_by_key(&self, key: &str, encrypted_value: &str) -> Result<bool, StoreError>;

    /// Delete a record. Returns true if it existed.
    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Fetch the encrypted value for a key.
    fn get_by_key(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// List all records ordered by key (metadata only, no values).
    fn list_keys(&self) -> Result<Vec<RecordMeta>, StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn insert(&self, key: &str, encrypted_value: &str) -> Result<RecordMeta, StoreError> {
        (**self).insert(key, encrypted_value)
    }

    fn update_by_key(&self, key: &str, encrypted_value: &str) -> Result<bool, StoreError> {
        (**self).update_by_key(key, encrypted_value)
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete_by_key(key)
    }

    fn get_by_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_by_key(key)
    }

    fn list_keys(&self) -> Result<Vec<RecordMeta>, StoreError> {
        (**self).list_keys()
    }
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteRecordStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteRecordStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a metadata row (key_name, created_at, updated_at).
    fn row_to_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordMeta> {
        let key: String = row.get(0)?;
        let created_at_str: String = row.get(1)?;
        let updated_at_str: String = row.get(2)?;

        Ok(RecordMeta {
            key,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

impl<'a> RecordStore for SqliteRecordStore<'a> {
    fn insert(&self, key: &str, encrypted_value: &str) -> Result<RecordMeta, StoreError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        self.db
            .conn()
            .execute(
                "INSERT INTO secrets (key_name, encrypted_value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, encrypted_value, stamp, stamp],
            )
            .map_err(|e| StoreError::from_insert(e, key))?;

        tracing::debug!(key = %key, "Secret record inserted");

        Ok(RecordMeta {
            key: key.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn update_by_key(&self, key: &str, encrypted_value: &str) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "UPDATE secrets SET encrypted_value = ?1, updated_at = ?2 WHERE key_name = ?3",
            params![encrypted_value, Utc::now().to_rfc3339(), key],
        )?;

        Ok(affected > 0)
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM secrets WHERE key_name = ?1", params![key])?;

        Ok(affected > 0)
    }

    fn get_by_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .db
            .conn()
            .query_row(
                "SELECT encrypted_value FROM secrets WHERE key_name = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    fn list_keys(&self) -> Result<Vec<RecordMeta>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT key_name, created_at, updated_at
             FROM secrets ORDER BY key_name ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_meta)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
