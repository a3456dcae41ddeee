// Keysafe — Audit Module
//
// Append-only record of who touched which secret, and how. The secret
// manager writes here after the primary operation has completed; a failing
// sink is logged and ignored, never surfaced to the caller.

mod sqlite;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::SqliteAuditSink;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown audit action: {0}")]
    UnknownAction(String),
}

/// The secret operation being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Store,
    Update,
    Retrieve,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Store => "store",
            AuditAction::Update => "update",
            AuditAction::Retrieve => "retrieve",
            AuditAction::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(AuditAction::Store),
            "update" => Ok(AuditAction::Update),
            "retrieve" => Ok(AuditAction::Retrieve),
            "delete" => Ok(AuditAction::Delete),
            other => Err(AuditError::UnknownAction(other.to_string())),
        }
    }
}

/// One audit row. Carries the key name only, never the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub key: String,
    pub actor: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, key: &str, actor: Option<&str>) -> Self {
        Self {
            action,
            key: key.to_string(),
            actor: actor.map(str::to_string),
            ip_address: None,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} '{}' by '{}'",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.key,
            self.actor.as_deref().unwrap_or("unknown")
        )?;
        if let Some(ref ip) = self.ip_address {
            write!(f, " from {}", ip)?;
        }
        Ok(())
    }
}

/// One-way destination for audit entries.
pub trait AuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

impl<T: AuditSink + ?Sized> AuditSink for &T {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        (**self).record(entry)
    }
}

/// Emits audit entries as structured `tracing` events on the
/// `keysafe::audit` target. Used when no audit table is available.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        tracing::info!(
            target: "keysafe::audit",
            action = %entry.action,
            key = %entry.key,
            actor = entry.actor.as_deref().unwrap_or("unknown"),
            "Secret accessed"
        );
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
