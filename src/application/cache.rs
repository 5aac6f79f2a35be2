//! Bounded LRU cache with optional per-entry expiry.
//!
//! Capacity counts slots, not live entries: an expired entry keeps its slot until
//! a read purges it or it is evicted from the tail. There is no background sweep.

use crate::application::metrics::CacheMetrics;
use crate::application::ports::Clock;
use crate::domain::config::CacheConfig;
use crate::domain::recency::{expiry_for, Lookup, RecencyList};
use crate::infrastructure::clock::SystemClock;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// Capacity- and TTL-bounded key/value store with least-recently-used eviction.
///
/// Reads hand out clones; callers never hold references into the cache.
///
/// # Example
///
/// ```
/// use resource_guard::BoundedCache;
///
/// let cache = BoundedCache::new(2, None);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// assert_eq!(cache.get("a"), Some(1));
///
/// // "b" is now least recently used
/// cache.set("c", 3);
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.get("a"), Some(1));
/// assert_eq!(cache.get("c"), Some(3));
/// ```
pub struct BoundedCache<K, V> {
    entries: Mutex<RecencyList<K, V>>,
    default_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    metrics: CacheMetrics,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache with `capacity` slots.
    ///
    /// `default_ttl` applies to every `set`; `None` means entries never expire.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        Self::with_config(CacheConfig {
            capacity,
            default_ttl,
        })
    }

    /// Create a cache from a configuration, using the system clock.
    ///
    /// # Panics
    /// Panics if the configuration does not validate.
    pub fn with_config(config: CacheConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("{e}");
        }
        Self {
            entries: Mutex::new(RecencyList::new(config.capacity)),
            default_ttl: config.default_ttl,
            clock: Arc::new(SystemClock::new()),
            metrics: CacheMetrics::new(),
        }
    }

    /// Replace the clock used for expiry.
    ///
    /// Must be called before any entry is written; expiry instants are only
    /// comparable against the clock that produced them.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a fresh value, promoting it to most recently used.
    ///
    /// An entry found expired is purged and reported as absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        match self.lock().get(key, now) {
            Lookup::Hit(value) => {
                self.metrics.record_hit();
                Some(value.clone())
            }
            Lookup::Expired => {
                trace!("purged expired cache entry on read");
                self.metrics.record_expiration();
                self.metrics.record_miss();
                None
            }
            Lookup::Miss => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Insert or refresh an entry using the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.insert(key, value, self.default_ttl);
    }

    /// Insert or refresh an entry that expires `ttl` from now.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.insert(key, value, Some(ttl));
    }

    /// Remove an entry, returning its value even if it had expired.
    pub fn remove_value<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().remove(key)
    }

    /// Remove every entry.
    pub fn remove_all(&self) {
        self.lock().clear();
    }

    /// Check for a fresh entry without touching recency or purging.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.lock().contains(key, now)
    }

    /// Number of occupied slots, including expired entries not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Keys from most to least recently used, expired entries included.
    pub fn keys(&self) -> Vec<K> {
        self.lock().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Get cache metrics.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn insert(&self, key: K, value: V, ttl: Option<Duration>) {
        let expires_at = expiry_for(self.clock.now(), ttl);
        let evicted = self.lock().insert(key, value, expires_at);
        if evicted.is_some() {
            trace!("evicted least recently used cache entry");
            self.metrics.record_eviction();
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecencyList<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("default_ttl", &self.default_ttl)
            .field("clock", &self.clock)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::time::Instant;

    fn cache_with_clock(
        capacity: usize,
        default_ttl: Option<Duration>,
    ) -> (BoundedCache<String, u32>, MockClock) {
        let clock = MockClock::new(Instant::now());
        let cache = BoundedCache::new(capacity, default_ttl).with_clock(Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_lru_eviction_after_touch() {
        let cache = BoundedCache::new(2, None);

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.metrics().evictions(), 1);
    }

    #[test]
    #[should_panic(expected = "cache capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _: BoundedCache<u8, u8> = BoundedCache::new(0, None);
    }

    #[test]
    #[should_panic(expected = "cache capacity must be greater than 0")]
    fn test_with_config_rejects_zero_capacity() {
        let _: BoundedCache<u8, u8> = BoundedCache::with_config(CacheConfig {
            capacity: 0,
            default_ttl: Some(Duration::from_secs(1)),
        });
    }

    #[test]
    fn test_ttl_expiry_purges_on_read() {
        let (cache, clock) = cache_with_clock(4, None);

        cache.set_with_ttl("session".to_string(), 7, Duration::from_millis(100));
        clock.advance(Duration::from_millis(99));
        assert_eq!(cache.get("session"), Some(7));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("session"), None);
        assert_eq!(cache.len(), 0);

        let snapshot = cache.metrics().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.expirations, 1);
    }

    #[test]
    fn test_default_ttl_applies_to_set() {
        let (cache, clock) = cache_with_clock(4, Some(Duration::from_secs(5)));

        cache.set("a".to_string(), 1);
        cache.set_with_ttl("b".to_string(), 2, Duration::from_secs(60));
        clock.advance(Duration::from_secs(10));

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_refresh_resets_expiry() {
        let (cache, clock) = cache_with_clock(2, Some(Duration::from_secs(1)));

        cache.set("a".to_string(), 1);
        clock.advance(Duration::from_millis(900));
        cache.set("a".to_string(), 2);
        clock.advance(Duration::from_millis(900));

        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_expired_entries_hold_capacity_until_touched() {
        let (cache, clock) = cache_with_clock(2, None);

        cache.set_with_ttl("stale".to_string(), 1, Duration::from_secs(1));
        cache.set("live".to_string(), 2);
        clock.advance(Duration::from_secs(2));

        assert!(!cache.contains_key("stale"));
        assert_eq!(cache.len(), 2);

        // The stale entry is the LRU tail and is evicted, not the live one
        cache.set("new".to_string(), 3);
        assert_eq!(cache.keys(), vec!["new".to_string(), "live".to_string()]);
    }

    #[test]
    fn test_contains_key_does_not_promote() {
        let cache = BoundedCache::new(2, None);
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.contains_key("a"));
        cache.set("c", 3);
        assert!(!cache.contains_key("a"));
        assert_eq!(cache.metrics().snapshot().total_reads(), 0);
    }

    #[test]
    fn test_remove_value_and_remove_all() {
        let cache = BoundedCache::new(3, None);
        cache.set(1, "one");
        cache.set(2, "two");
        cache.set(3, "three");

        assert_eq!(cache.remove_value(&2), Some("two"));
        assert_eq!(cache.remove_value(&2), None);
        assert_eq!(cache.len(), 2);

        cache.remove_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_concurrent_writers_respect_capacity() {
        let cache = Arc::new(BoundedCache::new(16, None));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        cache.set((t, i), i);
                        let _ = cache.get(&(t, i / 2));
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
        assert_eq!(cache.metrics().evictions(), 8 * 500 - 16);
    }
}
