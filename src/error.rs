// Keysafe — Top-level error types
//
// Aggregates errors from the manager, config, store, cipher and audit modules
// into a single error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Keysafe operations.
#[derive(Debug, Error)]
pub enum KeysafeError {
    #[error(transparent)]
    Secret(#[from] crate::manager::SecretError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] crate::cipher::CryptoError),

    #[error("Audit error: {0}")]
    Audit(#[from] crate::audit::AuditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KeysafeError>;
