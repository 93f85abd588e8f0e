//! Keyed async mutexes
//!
//! Serialises writers on the same barcode (or reservation) inside this
//! process. Writers on different keys never contend. An entry lives only
//! while someone holds or waits on it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

/// Exclusive access to one key. Dropping it releases the key and evicts
/// the entry when nobody else is queued on it.
pub struct KeyedGuard {
    key: i32,
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        // The guard holds a strong reference; release it before counting.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: i32) -> KeyedGuard {
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            key,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(1).await;

        let contender = locks.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(30), contender.lock(1)).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.lock(1)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(30), locks.lock(2))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
        drop(b);
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn entries_are_evicted_once_released() {
        let locks = KeyedLocks::new();
        for key in 0..100 {
            let _guard = locks.lock(key).await;
        }
        assert!(locks.is_empty());

        let first = locks.lock(7).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The queued waiter keeps the entry alive.
        drop(first);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
