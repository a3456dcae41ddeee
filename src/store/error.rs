// Keysafe — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Secret already exists: {0}")]
    Conflict(String),

    #[error("Database not found at {0} — run `keysafe init` first")]
    NotInitialized(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Map a failed INSERT to `Conflict` when it tripped the unique index on `key_name`.
    pub(crate) fn from_insert(err: rusqlite::Error, key: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::Conflict(key.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}
