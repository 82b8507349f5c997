//! Bookkeeping for detached background refreshes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pressroom_core::CacheKey;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    in_flight: Mutex<HashSet<CacheKey>>,
    idle: Notify,
}

/// Tracks which keys have a background refresh running in this process.
///
/// At most one refresh per key is admitted at a time. Shutdown code uses
/// [`RefreshTracker::drain`] to let running refreshes finish their writes.
#[derive(Debug, Clone, Default)]
pub struct RefreshTracker {
    inner: Arc<Inner>,
}

/// Marks a refresh as running until dropped.
#[derive(Debug)]
pub struct RefreshGuard {
    inner: Arc<Inner>,
    key: CacheKey,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock();
        in_flight.remove(&self.key);
        if in_flight.is_empty() {
            self.inner.idle.notify_waiters();
        }
    }
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a refresh for `key`, or returns `None` if one is already running.
    pub fn try_begin(&self, key: &CacheKey) -> Option<RefreshGuard> {
        let mut in_flight = self.inner.in_flight.lock();
        if !in_flight.insert(key.clone()) {
            return None;
        }

        Some(RefreshGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        })
    }

    /// Number of refreshes currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// Resolves once no refresh is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let idle = self.inner.in_flight.lock().is_empty();
            if idle {
                return;
            }

            notified.await;
        }
    }

    /// Waits for running refreshes up to `timeout`. Returns false on timeout.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> CacheKey {
        CacheKey::from_raw(raw)
    }

    #[test]
    fn test_one_refresh_per_key() {
        let tracker = RefreshTracker::new();

        let first = tracker.try_begin(&key("a"));
        assert!(first.is_some());
        assert!(tracker.try_begin(&key("a")).is_none());
        assert!(tracker.try_begin(&key("b")).is_some());

        drop(first);
        assert!(tracker.try_begin(&key("a")).is_some());
    }

    #[test]
    fn test_in_flight_count() {
        let tracker = RefreshTracker::new();
        let a = tracker.try_begin(&key("a")).unwrap();
        let b = tracker.try_begin(&key("b")).unwrap();

        assert_eq!(tracker.in_flight(), 2);
        drop(a);
        assert_eq!(tracker.in_flight(), 1);
        drop(b);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let tracker = RefreshTracker::new();
        assert!(tracker.drain(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_drain_waits_for_guard() {
        let tracker = RefreshTracker::new();
        let guard = tracker.try_begin(&key("a")).unwrap();

        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(guard);
        });

        assert!(tracker.drain(Duration::from_secs(2)).await);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let tracker = RefreshTracker::new();
        let _guard = tracker.try_begin(&key("a")).unwrap();

        assert!(!tracker.drain(Duration::from_millis(20)).await);
    }
}
