//! Per-file mutual exclusion.
//!
//! Chunk ingestion is a read-modify-write of one metadata record; two
//! concurrent uploads for the same file identifier would race and lose an
//! append. Every mutation of a record happens under the lock keyed by its
//! file identifier. Locks are created on demand and swept from the map once
//! nobody holds or awaits them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct FileLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `file_id`, waiting behind any in-flight operation
    /// on the same identifier. Operations on different identifiers never
    /// contend.
    pub async fn acquire(&self, file_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Idle entries are only referenced by the map itself.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(file_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of live lock entries. Test helper.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_serializes() {
        let locks = FileLocks::new();
        let counter = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("same-file").await;
                let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(inside, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_run_concurrently() {
        let locks = FileLocks::new();
        let a = locks.acquire("file-a").await;
        // Must not deadlock even while "file-a" is held.
        let b = locks.acquire("file-b").await;
        drop(a);
        drop(b);
    }

    #[tokio::test]
    async fn idle_entries_are_swept() {
        let locks = FileLocks::new();
        {
            let _guard = locks.acquire("ephemeral").await;
        }
        // The next acquire sweeps entries nobody references anymore.
        let _other = locks.acquire("other").await;
        assert_eq!(locks.len().await, 1);
    }
}
