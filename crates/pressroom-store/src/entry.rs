//! Stored cache entries and their age arithmetic.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached value together with the metadata the store manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// Full cache key the entry was written under.
    pub key: String,
    /// When the entry was written, in milliseconds since the Unix epoch.
    pub stored_at_ms: u64,
    /// Time-to-live in milliseconds.
    pub ttl_ms: u64,
    /// Opaque JSON payload.
    pub value: serde_json::Value,
}

impl StoredEntry {
    pub fn new(key: impl Into<String>, value: serde_json::Value, stored_at_ms: u64, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            stored_at_ms,
            ttl_ms: ttl.as_millis() as u64,
            value,
        }
    }

    /// Age of the entry at `now_ms`. Entries written "in the future" by a
    /// process with a skewed clock have age zero.
    pub fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.stored_at_ms))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Instant at which the entry stops being servable.
    pub fn expires_at_ms(&self) -> u64 {
        self.stored_at_ms.saturating_add(self.ttl_ms)
    }

    /// True once the entry's own TTL has elapsed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}
