//! Filesystem-backed store shared by all worker processes on a host.

mod layout;
mod lock;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pressroom_core::{Clock, SystemClock};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::entry::StoredEntry;
use crate::error::{Result, StoreError};
use crate::store::Store;

use layout::{EntryPaths, FileKind, is_entry_file};
use lock::LockPolicy;

/// Configuracion del store en disco.
#[derive(Debug, Clone)]
pub struct DiskStoreConfig {
    /// Directorio raiz del store.
    pub root: PathBuf,
    /// Tiempo maximo de espera por un lock (default: 2s)
    pub lock_timeout: Duration,
    /// Edad a partir de la cual un lock se considera abandonado (default: 30s)
    pub stale_lock_after: Duration,
}

impl DiskStoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: Duration::from_secs(2),
            stale_lock_after: Duration::from_secs(30),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }
}

/// Key/value store persisted as one JSON file per key.
///
/// Writers serialize on a per-key lock file and publish with an atomic
/// rename, so readers never observe a partially written entry and never
/// need the lock. Concurrent writers to the same key are last-writer-wins.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use pressroom_store::{DiskStore, DiskStoreConfig, Store};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), pressroom_store::StoreError> {
/// let store = DiskStore::open(DiskStoreConfig::new("/var/cache/pressroom")).await?;
/// store
///     .set("www:publications:report", serde_json::json!({"title": "Report"}), Duration::from_secs(300))
///     .await?;
///
/// if let Some(entry) = store.get("www:publications:report").await? {
///     println!("cached at {}", entry.stored_at_ms);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
    locks: LockPolicy,
    clock: Arc<dyn Clock>,
}

impl DiskStore {
    /// Opens (creating if needed) a store rooted at `config.root`.
    pub async fn open(config: DiskStoreConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Opens a store that ages entries with the given clock.
    pub async fn open_with_clock(config: DiskStoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        fs::create_dir_all(&config.root)
            .await
            .map_err(|e| StoreError::io(&config.root, e))?;

        debug!(root = %config.root.display(), "Disk store opened");

        Ok(Self {
            root: config.root,
            locks: LockPolicy {
                timeout: config.lock_timeout,
                stale_after: config.stale_lock_after,
            },
            clock,
        })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, key: &str) -> EntryPaths {
        EntryPaths::for_key(&self.root, key)
    }

    /// Reads and decodes an entry file. Missing files are `None`; files that
    /// fail to decode are reported as `None` with a warning.
    async fn read_entry(path: &Path) -> Result<Option<StoredEntry>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        match serde_json::from_slice::<StoredEntry>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                Ok(None)
            },
        }
    }

    async fn remove_file(path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Collects every file in the bucket directories (two levels deep).
    async fn bucket_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut dirs = vec![(self.root.clone(), 0usize)];

        while let Some((dir, depth)) = dirs.pop() {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(&dir, e)),
            };

            while let Some(item) = read_dir
                .next_entry()
                .await
                .map_err(|e| StoreError::io(&dir, e))?
            {
                let path = item.path();
                let file_type = item
                    .file_type()
                    .await
                    .map_err(|e| StoreError::io(&path, e))?;

                if file_type.is_dir() && depth < 2 {
                    dirs.push((path, depth + 1));
                } else if file_type.is_file() && depth == 2 {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.bucket_files().await?;
        files.retain(|path| is_entry_file(path));
        Ok(files)
    }

    /// Removes lock and scratch files that crashed writers left behind.
    async fn reclaim_orphans(&self, files: &[PathBuf]) -> Result<usize> {
        let stale_after = self.locks.stale_after;
        let mut reclaimed = 0;

        for path in files {
            let removed = match FileKind::of(path) {
                Some(FileKind::Lock) => {
                    lock::modified_age(path).await?.is_some_and(|age| age > stale_after)
                        && lock::break_if_stale(path, stale_after).await?
                },
                Some(FileKind::Scratch) => {
                    lock::modified_age(path).await?.is_some_and(|age| age > stale_after)
                        && Self::remove_file(path).await?
                },
                Some(FileKind::Entry) | None => false,
            };

            if removed {
                reclaimed += 1;
            }
        }

        Ok(reclaimed)
    }
}

#[async_trait]
impl Store for DiskStore {
    #[instrument(level = "trace", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>> {
        let paths = self.paths(key);

        let Some(entry) = Self::read_entry(&paths.entry).await? else {
            return Ok(None);
        };

        if entry.key != key {
            warn!(key = %key, stored = %entry.key, "Cache entry digest collision");
            return Ok(None);
        }

        if entry.is_expired(self.clock.now_millis()) {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    #[instrument(level = "trace", skip(self, value))]
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        let paths = self.paths(key);
        fs::create_dir_all(&paths.dir)
            .await
            .map_err(|e| StoreError::io(&paths.dir, e))?;

        let _lock = lock::acquire(&paths.lock, key, self.locks).await?;

        let entry = StoredEntry::new(key, value, self.clock.now_millis(), ttl);
        let bytes = serde_json::to_vec(&entry)?;

        let tmp = paths.tmp();
        if let Err(e) = fs::write(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }

        if let Err(e) = fs::rename(&tmp, &paths.entry).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&paths.entry, e));
        }

        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        let paths = self.paths(key);

        match fs::metadata(&paths.dir).await {
            Ok(_) => {},
            // Nothing was ever written in this bucket.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(&paths.dir, e)),
        }

        let _lock = lock::acquire(&paths.lock, key, self.locks).await?;
        Self::remove_file(&paths.entry).await?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let now = self.clock.now_millis();
        let mut keys = Vec::new();

        for path in self.entry_files().await? {
            if let Some(entry) = Self::read_entry(&path).await? {
                if !entry.is_expired(now) {
                    keys.push(entry.key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let files = self.bucket_files().await?;
        let mut purged = 0;

        for path in files.iter().filter(|path| is_entry_file(path)) {
            let Some(paths) = EntryPaths::from_entry_file(&path) else {
                continue;
            };

            let candidate = Self::read_entry(&paths.entry).await?;
            let key = match candidate {
                Some(entry) if entry.is_expired(self.clock.now_millis()) => entry.key,
                Some(_) => continue,
                // Undecodable file: reclaim it too.
                None => String::new(),
            };

            let _lock = match lock::acquire(&paths.lock, &key, self.locks).await {
                Ok(lock) => lock,
                Err(StoreError::LockTimeout { .. }) => {
                    debug!(path = %paths.entry.display(), "Skipping locked entry during purge");
                    continue;
                },
                Err(e) => return Err(e),
            };

            // A writer may have refreshed the entry while we waited.
            let still_expired = match Self::read_entry(&paths.entry).await? {
                Some(entry) => entry.is_expired(self.clock.now_millis()),
                None => true,
            };

            if still_expired && Self::remove_file(&paths.entry).await? {
                purged += 1;
            }
        }

        let reclaimed = self.reclaim_orphans(&files).await?;
        if reclaimed > 0 {
            debug!(reclaimed, "Reclaimed orphaned lock and temp files");
        }

        Ok(purged)
    }

    fn name(&self) -> &str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_core::ManualClock;
    use serde_json::json;
    use std::time::SystemTime;

    async fn store_with_clock() -> (tempfile::TempDir, DiskStore, ManualClock) {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(1_000_000);
        let store = DiskStore::open_with_clock(
            DiskStoreConfig::new(dir.path()).with_lock_timeout(Duration::from_millis(200)),
            Arc::new(clock.clone()),
        )
        .await
        .unwrap();
        (dir, store, clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (_dir, store, _clock) = store_with_clock().await;

        store
            .set("site:indev:a", json!({"title": "A"}), Duration::from_secs(60))
            .await
            .unwrap();

        let entry = store.get("site:indev:a").await.unwrap().unwrap();
        assert_eq!(entry.key, "site:indev:a");
        assert_eq!(entry.value["title"], "A");
        assert_eq!(entry.stored_at_ms, 1_000_000);
        assert_eq!(entry.ttl(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_dir, store, _clock) = store_with_clock().await;

        assert!(store.get("site:indev:missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let (_dir, store, clock) = store_with_clock().await;

        store
            .set("k", json!(1), Duration::from_millis(1_000))
            .await
            .unwrap();

        clock.advance(Duration::from_millis(999));
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_resets_clock() {
        let (_dir, store, clock) = store_with_clock().await;

        store.set("k", json!("old"), Duration::from_millis(1_000)).await.unwrap();
        clock.advance(Duration::from_millis(800));
        store.set("k", json!("new"), Duration::from_millis(1_000)).await.unwrap();
        clock.advance(Duration::from_millis(800));

        let entry = store.get("k").await.unwrap().unwrap();
        assert_eq!(entry.value, json!("new"));
        assert_eq!(entry.age(clock.now_millis()), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store, _clock) = store_with_clock().await;

        store.set("k", json!(1), Duration::from_secs(60)).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("never-written").await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_lock_or_tmp_files_left_behind() {
        let (dir, store, _clock) = store_with_clock().await;

        store.set("k", json!(1), Duration::from_secs(60)).await.unwrap();
        store.delete("k").await.unwrap();
        store.set("k", json!(2), Duration::from_secs(60)).await.unwrap();

        let paths = EntryPaths::for_key(dir.path(), "k");
        let names: Vec<_> = std::fs::read_dir(&paths.dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();

        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let (dir, store, _clock) = store_with_clock().await;

        let paths = EntryPaths::for_key(dir.path(), "k");
        std::fs::create_dir_all(&paths.dir).unwrap();
        std::fs::write(&paths.entry, b"{not json").unwrap();

        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", json!("fixed"), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap().value, json!("fixed"));
    }

    #[tokio::test]
    async fn test_set_times_out_on_held_lock() {
        let (dir, store, _clock) = store_with_clock().await;

        let paths = EntryPaths::for_key(dir.path(), "k");
        std::fs::create_dir_all(&paths.dir).unwrap();
        std::fs::write(&paths.lock, b"").unwrap();

        let err = store
            .set("k", json!(1), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { ref key, .. } if key == "k"));

        let err = store.delete("k").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_keys_lists_live_entries() {
        let (_dir, store, clock) = store_with_clock().await;

        store.set("site:indev:a", json!(1), Duration::from_secs(60)).await.unwrap();
        store.set("site:indev:b", json!(2), Duration::from_secs(60)).await.unwrap();
        store.set("site:publications:c", json!(3), Duration::from_millis(10)).await.unwrap();

        clock.advance(Duration::from_millis(10));

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["site:indev:a".to_string(), "site:indev:b".to_string()]);
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_expired() {
        let (_dir, store, clock) = store_with_clock().await;

        store.set("short", json!(1), Duration::from_millis(100)).await.unwrap();
        store.set("long", json!(2), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 0);

        clock.advance(Duration::from_millis(100));
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);

        assert!(store.get("long").await.unwrap().is_some());
        assert_eq!(store.keys().await.unwrap(), vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn test_purge_reclaims_corrupt_files() {
        let (dir, store, _clock) = store_with_clock().await;

        let paths = EntryPaths::for_key(dir.path(), "k");
        std::fs::create_dir_all(&paths.dir).unwrap();
        std::fs::write(&paths.entry, b"garbage").unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(!paths.entry.exists());
    }

    #[tokio::test]
    async fn test_purge_reclaims_orphaned_lock_and_temp_files() {
        let (dir, store, _clock) = store_with_clock().await;
        store.set("k", json!(1), Duration::from_secs(60)).await.unwrap();

        let paths = EntryPaths::for_key(dir.path(), "k");
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        let crashed_tmp = paths.tmp();
        let in_flight_tmp = paths.tmp();
        for path in [&crashed_tmp, &in_flight_tmp, &paths.lock] {
            std::fs::write(path, b"partial").unwrap();
        }
        for path in [&crashed_tmp, &paths.lock] {
            let file = std::fs::File::options().write(true).open(path).unwrap();
            file.set_modified(hour_ago).unwrap();
        }

        assert_eq!(store.purge_expired().await.unwrap(), 0);

        assert!(!crashed_tmp.exists());
        assert!(!paths.lock.exists());
        assert!(in_flight_tmp.exists());
        assert_eq!(store.get("k").await.unwrap().unwrap().value, json!(1));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_an_error() {
        let (dir, store, _clock) = store_with_clock().await;

        // A directory where the entry file belongs fails to read for any user.
        let paths = EntryPaths::for_key(dir.path(), "k");
        std::fs::create_dir_all(&paths.entry).unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { ref path, .. } if *path == paths.entry));
    }

    #[tokio::test]
    async fn test_open_under_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();

        let err = DiskStore::open(DiskStoreConfig::new(file.join("cache")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
