//! Error types for cache stores.

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur when reading or writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O operation on the store directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another writer held the entry lock for longer than allowed.
    #[error("timed out after {}ms waiting for lock on '{key}'", waited.as_millis())]
    LockTimeout { key: String, waited: Duration },

    /// An entry could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a new I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if retrying the operation later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

/// Type alias for Results with StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
