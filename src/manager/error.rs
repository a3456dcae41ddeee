// Keysafe — Secret manager error types
//
// Each variant is a distinct outcome a front end can report precisely.
// Cache and audit failures never appear here.

use thiserror::Error;

use crate::cipher::CryptoError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Invalid key name: {0}")]
    InvalidKey(String),

    #[error("Secret '{0}' already exists (use update or --force)")]
    AlreadyExists(String),

    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}
