//! In-memory cache for short-lived engine bookkeeping.
//!
//! Uses moka's concurrent cache implementation.

use std::time::Duration;

use moka::sync::Cache;

/// Thread-safe in-memory cache with capacity-based eviction and a
/// per-entry time-to-live.
///
/// The engine uses it to suppress near-duplicate trigger invocations;
/// entries expire after the TTL so a legitimate later re-fire reaches
/// the dispatcher's own idempotency gate.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`MemCache`].
    pub fn new(
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity as u64).time_to_live(ttl).build(),
        }
    }

    /// Insert or replace an entry.
    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    /// Look up an entry by key. Expired entries read as absent.
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache: MemCache<String, i64> = MemCache::new(16, Duration::from_millis(50));
        cache.set("k1".to_string(), 1);
        assert_eq!(cache.get(&"k1".to_string()), Some(1));

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get(&"k1".to_string()), None);
    }

    #[test]
    fn test_set_replaces_existing_entry() {
        let cache: MemCache<String, i64> = MemCache::new(16, Duration::from_secs(60));
        cache.set("k1".to_string(), 1);
        cache.set("k1".to_string(), 2);
        assert_eq!(cache.get(&"k1".to_string()), Some(2));
    }
}
