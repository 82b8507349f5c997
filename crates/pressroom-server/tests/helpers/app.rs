//! Application fixture over a temporary cache directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pressroom_core::{GroupAllowList, KeyBuilder};
use pressroom_server::cache::{ResponseCache, WrapOptions};
use pressroom_server::source::FileContentSource;
use pressroom_server::{AppState, create_router};
use pressroom_store::{DiskStore, DiskStoreConfig, Store, StoreError, StoredEntry};
use serde_json::Value;

use super::client::TestClient;

pub const KEY_PREFIX: &str = "test";

/// Which store operations fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    None,
    All,
    /// Reads work, `set` fails as on a full disk.
    Writes,
}

/// Store wrapper that counts calls and can be switched to fail.
pub struct RecordingStore {
    inner: DiskStore,
    pub deletes: AtomicUsize,
    pub sets: AtomicUsize,
    failure: StoreFailure,
}

impl RecordingStore {
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn check(&self) -> pressroom_store::Result<()> {
        if self.failure == StoreFailure::All {
            return Err(StoreError::io(
                self.inner.root(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
            ));
        }
        Ok(())
    }

    fn check_write(&self) -> pressroom_store::Result<()> {
        self.check()?;
        if self.failure == StoreFailure::Writes {
            return Err(StoreError::io(
                self.inner.root(),
                std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left on device"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn get(&self, key: &str) -> pressroom_store::Result<Option<StoredEntry>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> pressroom_store::Result<()> {
        self.check_write()?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> pressroom_store::Result<()> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn keys(&self) -> pressroom_store::Result<Vec<String>> {
        self.check()?;
        self.inner.keys().await
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub struct TestApp {
    pub cache_dir: tempfile::TempDir,
    pub content_dir: tempfile::TempDir,
    pub store: Arc<RecordingStore>,
    pub state: AppState,
    pub keys: KeyBuilder,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(StoreFailure::None).await
    }

    /// App whose store fails every operation.
    pub async fn with_failing_store() -> Self {
        Self::build(StoreFailure::All).await
    }

    /// App whose store can be read but not written.
    pub async fn with_failing_writes() -> Self {
        Self::build(StoreFailure::Writes).await
    }

    async fn build(failure: StoreFailure) -> Self {
        let cache_dir = tempfile::tempdir().unwrap();
        let content_dir = tempfile::tempdir().unwrap();

        let store = Arc::new(RecordingStore {
            inner: DiskStore::open(DiskStoreConfig::new(cache_dir.path())).await.unwrap(),
            deletes: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            failure,
        });

        let cache = ResponseCache::new(
            store.clone(),
            WrapOptions::new(Duration::from_secs(60), Duration::from_secs(10)),
        );
        let keys = KeyBuilder::new(KEY_PREFIX);
        let state = AppState::new(
            cache,
            keys.clone(),
            GroupAllowList::default(),
            Arc::new(FileContentSource::new(content_dir.path())),
        );

        Self {
            cache_dir,
            content_dir,
            store,
            state,
            keys,
        }
    }

    pub fn client(&self) -> TestClient {
        TestClient::new(create_router(self.state.clone()))
    }

    /// Writes an upstream document.
    pub fn write_document(&self, group: &str, item: &str, body: &Value) -> PathBuf {
        let dir = self.content_dir.path().join(group);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{item}.json"));
        std::fs::write(&path, serde_json::to_vec(body).unwrap()).unwrap();
        path
    }

    /// Writes an entry straight to the cache, bypassing the upstream.
    pub async fn seed(&self, group: &str, item: &str, value: Value) {
        let key = self.keys.build(group, item);
        self.store
            .inner
            .set(key.as_str(), value, Duration::from_secs(60))
            .await
            .unwrap();
    }

    pub async fn cached(&self, group: &str, item: &str) -> Option<Value> {
        let key = self.keys.build(group, item);
        self.store
            .inner
            .get(key.as_str())
            .await
            .unwrap()
            .map(|entry| entry.value)
    }
}
