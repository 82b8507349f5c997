//! Allow-list of recognised cache groups.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Groups recognised out of the box.
pub const DEFAULT_GROUPS: &[&str] = &["publications", "indev"];

/// A group name that passed allow-list validation. Always lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    /// Returns the group name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of group identifiers accepted by invalidation and content routes.
///
/// Entries are stored lower-cased and candidates are lower-cased before the
/// lookup, so `"Publications"` resolves to the `publications` group.
///
/// # Examples
///
/// ```
/// use pressroom_core::GroupAllowList;
///
/// let groups = GroupAllowList::default();
/// assert!(groups.resolve("publications").is_ok());
/// assert!(groups.resolve("not-a-real-group").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GroupAllowList {
    groups: BTreeSet<String>,
}

impl GroupAllowList {
    /// Builds an allow-list from group names.
    ///
    /// Fails when no group is given or a group is blank.
    pub fn new<I, S>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for group in groups {
            let group = group.as_ref().trim();
            if group.is_empty() {
                return Err(CoreError::invalid_allow_list("group names cannot be blank"));
            }
            set.insert(group.to_lowercase());
        }

        if set.is_empty() {
            return Err(CoreError::invalid_allow_list(
                "at least one group must be allowed",
            ));
        }

        Ok(Self { groups: set })
    }

    /// Validates `candidate` and returns it as a lower-cased [`GroupKey`].
    pub fn resolve(&self, candidate: &str) -> Result<GroupKey> {
        let normalized = candidate.to_lowercase();
        if self.groups.contains(&normalized) {
            Ok(GroupKey(normalized))
        } else {
            Err(CoreError::UnknownGroup {
                group: candidate.to_string(),
            })
        }
    }

    /// Returns true if `candidate` names an allowed group.
    pub fn contains(&self, candidate: &str) -> bool {
        self.groups.contains(&candidate.to_lowercase())
    }

    /// Iterates over the allowed groups in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Default for GroupAllowList {
    fn default() -> Self {
        Self {
            groups: DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for GroupAllowList {
    type Error = CoreError;

    fn try_from(value: Vec<String>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<GroupAllowList> for Vec<String> {
    fn from(value: GroupAllowList) -> Self {
        value.groups.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups() {
        let groups = GroupAllowList::default();

        assert!(groups.contains("publications"));
        assert!(groups.contains("indev"));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_resolve_lowercases() {
        let groups = GroupAllowList::default();
        let group = groups.resolve("PUBLICATIONS").unwrap();

        assert_eq!(group.as_str(), "publications");
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let groups = GroupAllowList::default();
        let err = groups.resolve("not-a-real-group").unwrap_err();

        assert!(matches!(err, CoreError::UnknownGroup { ref group } if group == "not-a-real-group"));
        assert!(err.to_string().contains("not-a-real-group"));
    }

    #[test]
    fn test_empty_allow_list_is_invalid() {
        let result = GroupAllowList::new(Vec::<String>::new());
        assert!(result.is_err());

        let result = GroupAllowList::new(["publications", "  "]);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_from_list() {
        let groups: GroupAllowList = serde_json::from_str(r#"["News", "indev"]"#).unwrap();

        assert!(groups.contains("news"));
        assert_eq!(groups.iter().collect::<Vec<_>>(), vec!["indev", "news"]);
    }

    #[test]
    fn test_deserialize_rejects_empty_list() {
        let result: std::result::Result<GroupAllowList, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }
}
