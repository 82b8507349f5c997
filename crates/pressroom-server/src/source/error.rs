//! Error types for content sources.

use std::path::PathBuf;

/// Errors that can occur when fetching upstream content.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The upstream has no document for this group and item.
    #[error("content not found: {group}/{item}")]
    NotFound { group: String, item: String },

    /// The upstream could not be reached.
    #[error("source unavailable: {reason}")]
    Unavailable { reason: String },

    /// An I/O error occurred.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upstream returned a document that is not valid JSON.
    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl SourceError {
    /// Creates a new not-found error.
    pub fn not_found(group: impl Into<String>, item: impl Into<String>) -> Self {
        Self::NotFound {
            group: group.into(),
            item: item.into(),
        }
    }

    /// Creates a new source unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns true if the document does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = SourceError::not_found("publications", "annual-report");
        assert_eq!(err.to_string(), "content not found: publications/annual-report");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unavailable_is_not_not_found() {
        let err = SourceError::unavailable("connection refused");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection refused"));
    }
}
