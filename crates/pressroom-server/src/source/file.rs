//! Filesystem-backed content source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{ContentSource, SourceError};

/// Serves JSON documents stored as `<root>/<group>/<item>.json`.
///
/// Group and item are used as given; callers validate them against path
/// traversal first. A missing root (an unmounted volume, say) makes the
/// source unavailable rather than every document not found.
#[derive(Debug, Clone)]
pub struct FileContentSource {
    root: PathBuf,
}

impl FileContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, group: &str, item: &str) -> PathBuf {
        self.root.join(group).join(format!("{item}.json"))
    }

    async fn missing(&self, group: &str, item: &str) -> SourceError {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => SourceError::not_found(group, item),
            Ok(_) => SourceError::unavailable(format!(
                "content root {} is not a directory",
                self.root.display()
            )),
            Err(e) => SourceError::unavailable(format!(
                "content root {}: {e}",
                self.root.display()
            )),
        }
    }
}

#[async_trait]
impl ContentSource for FileContentSource {
    async fn fetch(&self, group: &str, item: &str) -> Result<serde_json::Value, SourceError> {
        let path = self.document_path(group, item);
        debug!(path = %path.display(), "Reading content document");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.missing(group, item).await);
            },
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|e| SourceError::Parse {
            path,
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
