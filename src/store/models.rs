// Keysafe — Record data models
//
// Only metadata crosses the store boundary as a struct. The encrypted value
// is handed around as a bare string and never placed in a type that derives
// Debug or Serialize.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum key length, matching the `key_name` column width.
pub const MAX_KEY_LEN: usize = 254;

/// Metadata for one stored secret. Never contains the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for RecordMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (created {}, updated {})",
            self.key,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.updated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Parse an RFC 3339 timestamp column, falling back to "now" for rows
/// written by hand with a different format.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
