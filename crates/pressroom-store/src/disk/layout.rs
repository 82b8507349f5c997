//! Hash-bucketed on-disk layout.
//!
//! An entry for key `k` lives at `root/h[0..2]/h[2..4]/h.json`, where `h` is
//! the lower-case hex SHA-256 of `k`. Its lock file sits next to it as
//! `h.lock`, and in-progress writes as `h.<uuid>.tmp`. Breaking a stale lock
//! briefly adds `h.lock.break` and `h.lock.<uuid>.stale`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub(crate) const ENTRY_EXTENSION: &str = "json";
pub(crate) const LOCK_EXTENSION: &str = "lock";
pub(crate) const TMP_EXTENSION: &str = "tmp";
const SCRATCH_EXTENSIONS: [&str; 3] = [TMP_EXTENSION, "stale", "break"];

/// What a file found in a bucket directory is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileKind {
    Entry,
    Lock,
    /// Left behind only by a writer that died mid-operation.
    Scratch,
}

impl FileKind {
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            ENTRY_EXTENSION => Some(Self::Entry),
            LOCK_EXTENSION => Some(Self::Lock),
            ext if SCRATCH_EXTENSIONS.contains(&ext) => Some(Self::Scratch),
            _ => None,
        }
    }
}

/// Paths belonging to one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryPaths {
    pub dir: PathBuf,
    pub entry: PathBuf,
    pub lock: PathBuf,
}

impl EntryPaths {
    pub fn for_key(root: &Path, key: &str) -> Self {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        let dir = root.join(&digest[0..2]).join(&digest[2..4]);

        Self {
            entry: dir.join(format!("{digest}.{ENTRY_EXTENSION}")),
            lock: dir.join(format!("{digest}.{LOCK_EXTENSION}")),
            dir,
        }
    }

    /// Rebuilds the paths of an entry file found while walking the tree.
    pub fn from_entry_file(entry: &Path) -> Option<Self> {
        let dir = entry.parent()?.to_path_buf();
        let stem = entry.file_stem()?.to_str()?;

        Some(Self {
            lock: dir.join(format!("{stem}.{LOCK_EXTENSION}")),
            entry: entry.to_path_buf(),
            dir,
        })
    }

    /// A fresh temporary path for a write; unique per writer.
    pub fn tmp(&self) -> PathBuf {
        let mut name = self
            .entry
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{TMP_EXTENSION}", Uuid::new_v4().simple()));
        self.dir.join(name)
    }
}

pub(crate) fn is_entry_file(path: &Path) -> bool {
    FileKind::of(path) == Some(FileKind::Entry)
}
