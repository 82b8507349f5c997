//! Error types for Pressroom core types.

use thiserror::Error;

/// Errors raised while validating cache groups and keys.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The group is not part of the configured allow-list.
    #[error("unknown cache group '{group}'")]
    UnknownGroup {
        /// Group as supplied by the caller
        group: String,
    },

    /// The allow-list itself is malformed.
    #[error("invalid group allow-list: {reason}")]
    InvalidAllowList {
        /// Why it's invalid
        reason: String,
    },
}

impl CoreError {
    /// Creates an InvalidAllowList error.
    pub fn invalid_allow_list(reason: impl Into<String>) -> Self {
        Self::InvalidAllowList {
            reason: reason.into(),
        }
    }

    /// Returns true if this error rejects an unrecognised group.
    pub fn is_unknown_group(&self) -> bool {
        matches!(self, Self::UnknownGroup { .. })
    }
}

/// Type alias for Results with CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_group_display() {
        let error = CoreError::UnknownGroup {
            group: "nope".to_string(),
        };

        assert_eq!(error.to_string(), "unknown cache group 'nope'");
        assert!(error.is_unknown_group());
    }

    #[test]
    fn test_invalid_allow_list_display() {
        let error = CoreError::invalid_allow_list("empty");

        assert_eq!(error.to_string(), "invalid group allow-list: empty");
        assert!(!error.is_unknown_group());
    }
}
