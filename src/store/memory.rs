// Keysafe — In-Memory Record Store
//
// A process-local `RecordStore` for ephemeral use and tests. A single mutex
// guards the map, which makes insert-if-absent atomic across threads.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::models::RecordMeta;
use super::repository::RecordStore;
use super::StoreError;

struct StoredRecord {
    encrypted_value: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, key: &str, encrypted_value: &str) -> Result<RecordMeta, StoreError> {
        let mut records = self.lock()?;
        if records.contains_key(key) {
            return Err(StoreError::Conflict(key.to_string()));
        }

        let now = Utc::now();
        records.insert(
            key.to_string(),
            StoredRecord {
                encrypted_value: encrypted_value.to_string(),
                created_at: now,
                updated_at: now,
            },
        );

        Ok(RecordMeta {
            key: key.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn update_by_key(&self, key: &str, encrypted_value: &str) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        match records.get_mut(key) {
            Some(record) => {
                record.encrypted_value = encrypted_value.to_string();
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn get_by_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).map(|r| r.encrypted_value.clone()))
    }

    fn list_keys(&self) -> Result<Vec<RecordMeta>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .map(|(key, r)| RecordMeta {
                key: key.clone(),
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
