//! Store trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::entry::StoredEntry;
use crate::error::Result;

/// A durable key/value store with per-entry TTL.
///
/// This trait abstracts the persistence layer under the response cache so
/// the cache can be exercised against the filesystem store in production and
/// against recording or failing stores in tests.
///
/// # Implementors
///
/// - `DiskStore` - hash-bucketed files with lock files for multi-process safety
///
/// # Errors
///
/// I/O and lock failures are returned as errors and are never reported as a
/// missing entry.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the entry for `key`.
    ///
    /// Returns `Ok(None)` when the key was never written, was deleted, or its
    /// TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>>;

    /// Writes or overwrites the entry for `key`, restarting its TTL.
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;

    /// Removes the entry for `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lists keys of all entries that have not expired.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Removes expired entries and returns how many were reclaimed.
    ///
    /// The default implementation reclaims nothing, for stores whose backend
    /// expires entries on its own.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Returns the name of this store, for logging.
    fn name(&self) -> &str;
}
