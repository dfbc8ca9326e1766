//! Negative cache for keys confirmed absent.

use std::collections::HashSet;
use std::hash::Hash;

/// Records keys a lookup has confirmed absent from the backing store.
///
/// Entries persist until the scheduled refresh cycle (or an administrative
/// clear) re-checks them, so a missing config key costs one store round-trip
/// per cycle instead of one per event.
#[derive(Debug, Default)]
pub struct NegativeCache<K> {
    absent: HashSet<K>,
}

impl<K> NegativeCache<K>
where
    K: Eq + Hash,
{
    /// Create an empty negative cache.
    pub fn new() -> Self {
        Self {
            absent: HashSet::new(),
        }
    }

    /// Record a key as confirmed absent.
    pub fn mark_absent(&mut self, key: K) {
        self.absent.insert(key);
    }

    /// True when the key was confirmed absent and has not been re-checked.
    pub fn is_absent(&self, key: &K) -> bool {
        self.absent.contains(key)
    }

    /// Forget one key, forcing the next access to refetch.
    pub fn unmark(&mut self, key: &K) {
        self.absent.remove(key);
    }

    /// Forget everything; called by the refresh cycle.
    pub fn clear(&mut self) {
        self.absent.clear();
    }

    /// Number of confirmed-absent keys.
    pub fn len(&self) -> usize {
        self.absent.len()
    }

    /// True when no keys are marked absent.
    pub fn is_empty(&self) -> bool {
        self.absent.is_empty()
    }
}
