//! Caching primitives for the Gangway beta onboarding bot.
//!
//! - [`TtlCache`]: a bounded map whose entries expire after a per-entry or
//!   default TTL, with least-recently-used eviction at capacity.
//! - [`NegativeCache`]: keys confirmed absent, to avoid repeated failing
//!   lookups until the next refresh cycle clears them.
//! - [`KeyedLocks`]: a reference-counted registry of per-key async mutexes
//!   for serializing work on one logical key (e.g. one user id).

#![warn(missing_docs)]

mod locks;
mod negative;
mod ttl;

pub use locks::{KeyedLockGuard, KeyedLocks};
pub use negative::NegativeCache;
pub use ttl::{TtlCache, TtlCacheConfig};
