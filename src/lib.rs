// Keysafe — Library root
//
// Re-exports the cipher, store, cache, audit, manager, config and CLI modules.

pub mod audit;
pub mod cache;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod store;

pub use error::{KeysafeError, Result};
pub use manager::{CachePolicy, SecretError, SecretManager};
