//! TTL cache with LRU eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Configuration for a [`TtlCache`].
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct TtlCacheConfig {
    /// Default entry lifetime in seconds
    default_ttl_secs: u64,
    /// Maximum number of entries before LRU eviction
    max_size: usize,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 600,
            max_size: 1000,
        }
    }
}

impl TtlCacheConfig {
    /// Set the default TTL in seconds.
    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    /// Set the maximum entry count.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_access: Instant,
}

/// A bounded map whose entries expire after a TTL.
///
/// An entry is replaced atomically as a whole; readers never observe a
/// partially updated value. Callers needing shared access wrap the cache in
/// their own lock.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    config: TtlCacheConfig,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the given configuration.
    pub fn new(config: TtlCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Insert a value, optionally overriding the default TTL.
    ///
    /// Evicts the least recently used entry when at capacity.
    pub fn insert(&mut self, key: K, value: V, ttl_secs: Option<u64>) {
        let now = Instant::now();
        let ttl = Duration::from_secs(ttl_secs.unwrap_or(self.config.default_ttl_secs));

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_size {
            self.evict_lru();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_access: now,
            },
        );
    }

    /// Look up a live entry, refreshing its recency.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remove one entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, including any not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweep expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone())
        {
            tracing::debug!("Evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(TtlCacheConfig::default())
    }
}
