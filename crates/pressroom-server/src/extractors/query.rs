use serde::Deserialize;

/// Query parameters del endpoint /api/cache
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheActionQuery {
    pub action: Option<String>,
    pub group_key: Option<String>,
    pub item_key: Option<String>,
}

impl CacheActionQuery {
    /// Returns a required parameter or a message naming the missing one.
    pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, String> {
        value
            .as_deref()
            .ok_or_else(|| format!("Missing required parameter '{}'", name))
    }
}
