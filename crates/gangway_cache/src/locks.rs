//! Reference-counted per-key async mutex registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct LockEntry {
    lock: Arc<AsyncMutex<()>>,
    refs: usize,
}

type Registry = Arc<StdMutex<HashMap<String, LockEntry>>>;

/// A registry of per-key async mutexes.
///
/// Locks are created on first use and removed from the registry when the
/// last guard for the key drops, so the map only ever holds keys with live
/// waiters. The registry itself is guarded by a plain mutex held only to
/// bump reference counts, never across an await.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Registry,
}

impl KeyedLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn acquire(&self, key: &str) -> KeyedLockGuard {
        let lock = {
            let mut registry = self.inner.lock().expect("lock registry poisoned");
            let entry = registry.entry(key.to_string()).or_insert_with(|| LockEntry {
                lock: Arc::new(AsyncMutex::new(())),
                refs: 0,
            });
            entry.refs += 1;
            Arc::clone(&entry.lock)
        };
        let guard = lock.lock_owned().await;
        KeyedLockGuard {
            _guard: guard,
            registry: Arc::clone(&self.inner),
            key: key.to_string(),
        }
    }

    /// Number of keys currently registered (held or awaited).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock registry poisoned").len()
    }

    /// True when no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard holding one keyed lock; dropping it releases the lock and
/// decrements the key's reference count, removing the registry entry when
/// the count reaches zero.
pub struct KeyedLockGuard {
    _guard: OwnedMutexGuard<()>,
    registry: Registry,
    key: String,
}

impl Drop for KeyedLockGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().expect("lock registry poisoned");
        if let Some(entry) = registry.get_mut(&self.key) {
            entry.refs -= 1;
            if entry.refs == 0 {
                registry.remove(&self.key);
            }
        }
    }
}
