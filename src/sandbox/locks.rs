//! Per-sandbox mutual exclusion.
//!
//! Writers and the executor take the lock for the sandbox they touch, so two
//! requests never race on the same directory. Distinct sandboxes never
//! contend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are pruned once the map grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct SandboxLocks {
    inner: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl SandboxLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sandbox`. Released when the guard drops.
    pub async fn lock(&self, sandbox: &Path) -> OwnedMutexGuard<()> {
        if self.inner.len() > PRUNE_THRESHOLD {
            self.prune();
        }
        // Clone the Arc out so no map shard is held across the await.
        let mutex = self
            .inner
            .entry(sandbox.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop entries nobody is holding or waiting on.
    pub fn prune(&self) {
        self.inner.retain(|_, m| Arc::strong_count(m) > 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_sandbox_is_exclusive() {
        let locks = SandboxLocks::new();
        let path = Path::new("/tmp/ffmpeg_sandbox_a");

        let guard = locks.lock(path).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock(path)).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.lock(path)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn distinct_sandboxes_do_not_contend() {
        let locks = SandboxLocks::new();
        let _a = locks.lock(Path::new("/tmp/a")).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(Path::new("/tmp/b")))
            .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_entries() {
        let locks = SandboxLocks::new();
        let held = locks.lock(Path::new("/tmp/held")).await;
        drop(locks.lock(Path::new("/tmp/idle")).await);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
