// Keysafe — Secret Manager Module
//
// Orchestrates cipher, record store, cache and audit sink. The store is the
// source of truth; cache and audit are updated after the durable write and
// their failures never change the result of an operation.

mod error;
mod secret_manager;

pub use error::SecretError;
pub use secret_manager::{CachePolicy, SecretManager};
