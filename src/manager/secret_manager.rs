// Keysafe — Secret Manager
//
// Every mutating call follows the same order:
//   1. encrypt (failure is fatal)
//   2. durable write to the record store (failure is fatal)
//   3. refresh or drop the cache entry (best-effort)
//   4. append an audit entry (best-effort)
//
// Reads go cache → store → decrypt. A miss always falls through to the store,
// and a decryption failure is always an error, never an empty result.
//
// The manager holds no mutable state. Same-key races are settled by the
// record store's uniqueness guarantee.

use std::time::Duration;

use zeroize::Zeroizing;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::cache::Cache;
use crate::cipher::Cipher;
use crate::store::{RecordMeta, RecordStore, StoreError, MAX_KEY_LEN};

use super::SecretError;

/// How secrets are placed in the cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Prepended to the secret key to form the cache key.
    pub prefix: String,
    pub ttl: Duration,
}

pub struct SecretManager<'a> {
    cipher: Box<dyn Cipher + 'a>,
    store: Box<dyn RecordStore + 'a>,
    /// `None` when caching is disabled.
    cache: Option<Box<dyn Cache + 'a>>,
    /// `None` when audit logging is disabled.
    audit: Option<Box<dyn AuditSink + 'a>>,
    policy: CachePolicy,
    actor: Option<String>,
    ip_address: Option<String>,
}

impl<'a> SecretManager<'a> {
    pub fn new(
        cipher: Box<dyn Cipher + 'a>,
        store: Box<dyn RecordStore + 'a>,
        cache: Option<Box<dyn Cache + 'a>>,
        audit: Option<Box<dyn AuditSink + 'a>>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            cipher,
            store,
            cache,
            audit,
            policy,
            actor: None,
            ip_address: None,
        }
    }

    /// Attribute audit entries to `actor`.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Attach the caller's address to audit entries.
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    // ─── Operations ──────────────────────────────────────────────────────────

    /// Create a new secret. Fails with `AlreadyExists` if the key is taken;
    /// there is no implicit overwrite.
    pub fn store(&self, key: &str, value: &str) -> Result<(), SecretError> {
        validate_key(key)?;
        let encrypted = self.cipher.encrypt(value)?;

        self.store.insert(key, &encrypted).map_err(|e| match e {
            StoreError::Conflict(_) => SecretError::AlreadyExists(key.to_string()),
            other => {
                tracing::error!(key = %key, error = %other, "Failed to store secret");
                SecretError::Storage(other)
            }
        })?;

        self.cache_save(key, &encrypted);
        self.record_audit(AuditAction::Store, key);

        tracing::info!(key = %key, "Secret stored");
        Ok(())
    }

    /// Replace the value of an existing secret. Fails with `NotFound` if the
    /// key has no record; never creates one.
    pub fn update(&self, key: &str, value: &str) -> Result<(), SecretError> {
        validate_key(key)?;
        let encrypted = self.cipher.encrypt(value)?;

        let updated = self.store.update_by_key(key, &encrypted).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Failed to update secret");
            SecretError::Storage(e)
        })?;

        if !updated {
            return Err(SecretError::NotFound(key.to_string()));
        }

        self.cache_save(key, &encrypted);
        self.record_audit(AuditAction::Update, key);

        tracing::info!(key = %key, "Secret updated");
        Ok(())
    }

    /// Decrypt and return a secret, or `None` if no record exists.
    pub fn retrieve(&self, key: &str) -> Result<Option<Zeroizing<String>>, SecretError> {
        validate_key(key)?;

        let encrypted = match self.cache_get(key) {
            Some(hit) => hit,
            None => {
                let stored = self.store.get_by_key(key).map_err(|e| {
                    tracing::error!(key = %key, error = %e, "Failed to read secret");
                    SecretError::Storage(e)
                })?;

                let Some(stored) = stored else {
                    return Ok(None);
                };

                self.cache_save(key, &stored);
                stored
            }
        };

        let value = self.cipher.decrypt(&encrypted).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Failed to decrypt secret");
            e
        })?;

        self.record_audit(AuditAction::Retrieve, key);
        Ok(Some(Zeroizing::new(value)))
    }

    /// Remove a secret. Returns whether a record existed.
    pub fn delete(&self, key: &str) -> Result<bool, SecretError> {
        validate_key(key)?;

        let removed = self.store.delete_by_key(key).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Failed to delete secret");
            SecretError::Storage(e)
        })?;

        if removed {
            self.cache_delete(key);
            self.record_audit(AuditAction::Delete, key);
            tracing::info!(key = %key, "Secret deleted");
        }

        Ok(removed)
    }

    /// Key names with timestamps. Touches neither the cache nor the cipher.
    pub fn list_keys(&self) -> Result<Vec<RecordMeta>, SecretError> {
        self.store.list_keys().map_err(SecretError::Storage)
    }

    // ─── Best-effort side effects ────────────────────────────────────────────

    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.policy.prefix, key)
    }

    /// Any cache failure reads as a miss.
    fn cache_get(&self, key: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(&self.cache_key(key)) {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(hit)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    /// Refresh the cache after a durable write. If the save fails, the old
    /// entry is dropped so the cache cannot keep serving a superseded value.
    fn cache_save(&self, key: &str, encrypted: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let cache_key = self.cache_key(key);

        if let Err(e) = cache.save(&cache_key, encrypted, self.policy.ttl) {
            tracing::warn!(key = %key, error = %e, "Cache save failed, invalidating entry");
            if let Err(e) = cache.delete(&cache_key) {
                tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
            }
        }
    }

    fn cache_delete(&self, key: &str) {
        if let Some(cache) = self.cache.as_ref() {
            if let Err(e) = cache.delete(&self.cache_key(key)) {
                tracing::warn!(key = %key, error = %e, "Cache delete failed");
            }
        }
    }

    fn record_audit(&self, action: AuditAction, key: &str) {
        let Some(sink) = self.audit.as_ref() else {
            return;
        };

        let mut entry = AuditEntry::new(action, key, self.actor.as_deref());
        entry.ip_address = self.ip_address.clone();

        if let Err(e) = sink.record(&entry) {
            tracing::warn!(key = %key, action = %action, error = %e, "Audit log write failed");
        }
    }
}

fn validate_key(key: &str) -> Result<(), SecretError> {
    if key.trim().is_empty() {
        return Err(SecretError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.chars().count() > MAX_KEY_LEN {
        return Err(SecretError::InvalidKey(format!(
            "key exceeds {} characters",
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
