//! Advisory lock files shared between worker processes.
//!
//! A lock is held by whoever created `<digest>.lock` with `create_new`. The
//! file carries a token unique to its holder, and releasing only removes a
//! file that still carries that token.
//!
//! Writers that crash leave the file behind. Once it is older than the stale
//! threshold another writer may break it, but only while holding the
//! `<digest>.lock.break` guard, so one lock generation is broken at most once.
//! A holder that keeps a lock past the stale threshold may lose it.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);
const BREAK_GUARD_SUFFIX: &str = ".break";
const BROKEN_SUFFIX: &str = "stale";

/// Timing policy for lock acquisition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LockPolicy {
    pub timeout: Duration,
    pub stale_after: Duration,
}

/// Held lock. Dropping it releases the lock file if it is still ours.
#[derive(Debug)]
pub(crate) struct EntryLock {
    path: PathBuf,
    token: String,
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        match std::fs::read(&self.path) {
            Ok(current) if current == self.token.as_bytes() => {},
            Ok(_) => {
                warn!(path = %self.path.display(), "Lock file was taken over, leaving it in place");
                return;
            },
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read lock file on release");
                return;
            },
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to release lock file");
            }
        }
    }
}

/// Acquires the lock at `path`, waiting up to `policy.timeout`.
pub(crate) async fn acquire(path: &Path, key: &str, policy: LockPolicy) -> Result<EntryLock> {
    let start = Instant::now();

    loop {
        if let Some(lock) = try_create(path).await? {
            return Ok(lock);
        }

        if break_if_stale(path, policy.stale_after).await? {
            continue;
        }

        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(StoreError::LockTimeout {
                key: key.to_string(),
                waited,
            });
        }

        tokio::time::sleep(LOCK_RETRY_DELAY).await;
    }
}

/// Breaks the lock at `path` if it is older than `stale_after`.
///
/// Returns `true` when no lock file is left at `path`, either because it was
/// broken here or because its holder released it meanwhile.
pub(crate) async fn break_if_stale(path: &Path, stale_after: Duration) -> Result<bool> {
    match read_lock(path).await? {
        None => return Ok(true),
        Some(observed) if observed.age <= stale_after => return Ok(false),
        Some(_) => {},
    }

    let guard_path = with_suffix(path, BREAK_GUARD_SUFFIX);
    let Some(_guard) = try_create(&guard_path).await? else {
        // Another process is breaking it. A guard outlives its breaker only
        // if that breaker died mid-break.
        if modified_age(&guard_path).await?.is_some_and(|age| age > stale_after) {
            debug!(path = %guard_path.display(), "Removing abandoned break guard");
            remove_if_present(&guard_path).await?;
        }
        return Ok(false);
    };

    // A new holder may have taken the lock before we got the guard.
    let stale = match read_lock(path).await? {
        None => return Ok(true),
        Some(current) if current.age <= stale_after => return Ok(false),
        Some(current) => current,
    };

    let moved = with_suffix(path, &format!(".{}.{BROKEN_SUFFIX}", Uuid::new_v4().simple()));
    match fs::rename(path, &moved).await {
        Ok(()) => {},
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(StoreError::io(path, e)),
    }

    let moved_token = fs::read(&moved)
        .await
        .map_err(|e| StoreError::io(&moved, e))?;

    if moved_token != stale.token {
        // Released and re-taken between the check and the rename.
        if let Err(e) = fs::hard_link(&moved, path).await {
            warn!(path = %path.display(), error = %e, "Failed to restore a live lock file");
        }
        remove_if_present(&moved).await?;
        return Ok(false);
    }

    remove_if_present(&moved).await?;
    debug!(path = %path.display(), age_secs = stale.age.as_secs(), "Broke stale lock file");
    Ok(true)
}

/// Age of the file at `path` by modification time, `None` if it is gone.
pub(crate) async fn modified_age(path: &Path) -> Result<Option<Duration>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(age_of(&meta))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn try_create(path: &Path) -> Result<Option<EntryLock>> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let token = Uuid::new_v4().simple().to_string();
    let written = async {
        file.write_all(token.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(path).await;
        return Err(StoreError::io(path, e));
    }

    Ok(Some(EntryLock {
        path: path.to_path_buf(),
        token,
    }))
}

struct LockFile {
    token: Vec<u8>,
    age: Duration,
}

/// Reads token and age from one open handle so both describe the same file.
async fn read_lock(path: &Path) -> Result<Option<LockFile>> {
    let mut file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let meta = file.metadata().await.map_err(|e| StoreError::io(path, e))?;
    let mut token = Vec::new();
    file.read_to_end(&mut token)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    Ok(Some(LockFile {
        token,
        age: age_of(&meta),
    }))
}

fn age_of(meta: &std::fs::Metadata) -> Duration {
    meta.modified()
        .or_else(|_| meta.created())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .unwrap_or_default()
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
