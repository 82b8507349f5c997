//! Cache key derivation.

use std::fmt;

use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Separator between the prefix, group and item parts of a key.
pub const KEY_SEPARATOR: char = ':';

/// Fully namespaced cache key: `{prefix}:{group}:{item}`.
///
/// Keys are opaque once built. Two keys are equal exactly when their
/// string forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-built key string, e.g. one read back from the store.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds cache keys under a deployment-wide prefix.
///
/// The builder performs no normalization. Callers lower-case group and item
/// before building so that reads and deletes of the same logical entry
/// produce the same key.
///
/// # Examples
///
/// ```
/// use pressroom_core::KeyBuilder;
///
/// let keys = KeyBuilder::new("www-prod");
/// let key = keys.build("publications", "annual-report-2024");
/// assert_eq!(key.as_str(), "www-prod:publications:annual-report-2024");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    /// Creates a builder for the given global prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the global prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the key for `item` inside `group`.
    ///
    /// Empty components are accepted and yield a degenerate but well-formed key.
    pub fn build(&self, group: &str, item: &str) -> CacheKey {
        CacheKey(format!(
            "{}{sep}{}{sep}{}",
            self.prefix,
            group,
            item,
            sep = KEY_SEPARATOR
        ))
    }

    /// Glob pattern matching every key of `group` under this prefix.
    ///
    /// Prefix and group are escaped, so glob metacharacters inside them match
    /// literally.
    ///
    /// ```
    /// use pressroom_core::KeyBuilder;
    ///
    /// let keys = KeyBuilder::new("www");
    /// assert_eq!(keys.group_pattern("indev"), "www:indev:*");
    /// ```
    pub fn group_pattern(&self, group: &str) -> String {
        format!(
            "{}{sep}{}{sep}*",
            Pattern::escape(&self.prefix),
            Pattern::escape(group),
            sep = KEY_SEPARATOR
        )
    }
}
