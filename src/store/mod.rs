// Keysafe — Store Module
//
// Durable persistence of encrypted secrets keyed by unique name. The SQLite
// adapter is the default; the in-memory adapter is selectable through
// configuration. Both enforce at-most-one record per key.

mod db;
mod error;
mod memory;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use memory::MemoryRecordStore;
pub(crate) use models::parse_timestamp;
pub use models::{RecordMeta, MAX_KEY_LEN};
pub use repository::{RecordStore, SqliteRecordStore};
