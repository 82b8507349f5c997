use serde::Deserialize;

/// Extractor para rutas /content/{group}/{item}
#[derive(Debug, Deserialize)]
pub struct ContentPath {
    pub group: String,
    pub item: String,
}

impl ContentPath {
    /// Valida que los parametros no esten vacios ni contengan caracteres peligrosos.
    pub fn validate(&self) -> Result<(), String> {
        if self.group.trim().is_empty() {
            return Err("Group cannot be empty".to_string());
        }
        if self.item.trim().is_empty() {
            return Err("Item cannot be empty".to_string());
        }
        validate_item(&self.item)
    }

    /// Group and item lower-cased, as used to build cache keys.
    pub fn normalized(&self) -> (String, String) {
        (self.group.to_lowercase(), self.item.to_lowercase())
    }
}

/// Validates that the item does not contain dangerous characters.
fn validate_item(item: &str) -> Result<(), String> {
    // Prevent path traversal
    if item.contains("..") || item.contains('/') || item.contains('\\') {
        return Err("Item cannot contain path separators or '..'".to_string());
    }

    // Prevent control characters
    if item.chars().any(|c| c.is_control()) {
        return Err("Item cannot contain control characters".to_string());
    }

    Ok(())
}
