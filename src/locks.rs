//! Per-path lock registry.
//!
//! Every filesystem path that might be written is touched under its
//! registry lock, so many workers can run in parallel without two of them
//! mutating the same destination. The registry is an explicitly-owned
//! object injected into the organizer; its lifecycle is one organize run.
//!
//! Entries are created lazily and never removed - a run accumulates one
//! lock per distinct path touched, bounded by library size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::OwnedMutexGuard;

use crate::error::{Error, Result};

/// Lock-wait bound for copy and tag-update operations.
pub const FILE_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Lock-wait bound for lyric sidecar writes.
pub const LYRIC_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide map from path to a reusable mutual-exclusion lock.
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

/// Guard returned by [`LockRegistry::acquire`]; releases on drop.
pub struct PathGuard {
    _guard: OwnedMutexGuard<()>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `path`, creating it on first reference.
    ///
    /// The interior mutex guarantees concurrent first-touches of the same
    /// path never observe two distinct lock objects.
    pub fn get(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquires the lock for `path`, waiting at most `timeout`.
    pub async fn acquire(&self, path: &Path, timeout: Duration) -> Result<PathGuard> {
        let lock = self.get(path);
        let guard = tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| Error::LockTimeout(path.to_path_buf()))?;
        Ok(PathGuard { _guard: guard })
    }

    /// Acquires the locks for every path in `paths`, waiting at most
    /// `timeout` per lock.
    ///
    /// Paths are deduplicated and acquired in sorted order so two workers
    /// touching the same pair of paths cannot deadlock each other.
    pub async fn acquire_all(&self, paths: &[&Path], timeout: Duration) -> Result<Vec<PathGuard>> {
        let mut unique: Vec<&Path> = paths.to_vec();
        unique.sort();
        unique.dedup();

        let mut guards = Vec::with_capacity(unique.len());
        for path in unique {
            guards.push(self.acquire(path, timeout).await?);
        }
        Ok(guards)
    }

    /// Number of distinct paths ever locked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_same_path_yields_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.get(Path::new("/store/x.mp3"));
        let b = registry.get(Path::new("/store/x.mp3"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_paths_yield_distinct_locks() {
        let registry = LockRegistry::new();
        let a = registry.get(Path::new("/store/x.mp3"));
        let b = registry.get(Path::new("/store/y.mp3"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_touch_creates_one_lock() {
        let registry = Arc::new(LockRegistry::new());
        let path = PathBuf::from("/store/contested.mp3");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move { registry.get(&path) }));
        }

        let mut locks = Vec::new();
        for handle in handles {
            locks.push(handle.await.unwrap());
        }
        for lock in &locks[1..] {
            assert!(Arc::ptr_eq(&locks[0], lock));
        }
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_held() {
        let registry = LockRegistry::new();
        let path = Path::new("/store/held.mp3");

        let _held = registry
            .acquire(path, Duration::from_secs(1))
            .await
            .unwrap();

        let result = registry.acquire(path, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::LockTimeout(_))));
    }

    #[tokio::test]
    async fn test_acquire_after_release() {
        let registry = LockRegistry::new();
        let path = Path::new("/store/reuse.mp3");

        {
            let _guard = registry
                .acquire(path, Duration::from_millis(50))
                .await
                .unwrap();
        }
        // Dropped guard releases the lock.
        let again = registry.acquire(path, Duration::from_millis(50)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_all_dedupes_paths() {
        let registry = LockRegistry::new();
        let path = Path::new("/store/dup.mp3");

        // Same path twice must not self-deadlock.
        let guards = registry
            .acquire_all(&[path, path], Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(guards.len(), 1);
    }
}
