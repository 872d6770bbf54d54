//! Bounded TTL/LRU cache for evaluation results
//!
//! A single lock guards all state, including the read path's TTL check and
//! LRU touch, so the cache is safe under concurrent readers and writers.
//! Expired entries are evicted lazily on lookup and counted as misses;
//! inserting into a full cache evicts exactly the least-recently-used
//! entry.

use lru::LruCache;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Cache sizing and expiry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: usize,
    /// Entry time-to-live; `None` disables expiry
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Create a configuration with custom settings
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self { capacity, ttl }
    }

    /// Configuration optimized for low memory usage
    pub fn low_memory() -> Self {
        Self {
            capacity: 100,
            ttl: Some(Duration::from_secs(60)),
        }
    }

    /// Configuration for tests: tiny capacity, very short TTL
    pub fn testing() -> Self {
        Self {
            capacity: 4,
            ttl: Some(Duration::from_millis(50)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            ttl: Some(Duration::from_secs(300)),
        }
    }
}

/// Hit/miss accounting, accumulated until [`ResultCache::clear`]
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate in [0, 1]; zero when the cache has not been queried
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Point-in-time view of the cache returned by [`ResultCache::snapshot`]
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    /// Current number of live entries
    pub size: usize,
    /// Configured maximum number of entries
    pub capacity: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Hit rate in [0, 1]
    pub hit_rate: f64,
}

struct CacheEntry {
    value: Decimal,
    inserted_at: Instant,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
}

/// Thread-safe TTL/LRU result cache
pub struct ResultCache {
    inner: Mutex<CacheState>,
    ttl: Option<Duration>,
    capacity: usize,
}

impl ResultCache {
    /// Create a cache from a configuration
    ///
    /// # Panics
    /// Panics if the configured capacity is 0
    pub fn new(config: CacheConfig) -> Self {
        assert!(config.capacity > 0, "cache capacity must be greater than 0");
        let capacity = NonZeroUsize::new(config.capacity).expect("capacity must be non-zero");

        Self {
            inner: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            ttl: config.ttl,
            capacity: config.capacity,
        }
    }

    /// Look up a key, promoting a live entry to most-recently-used
    ///
    /// An entry older than the TTL is evicted and counted as a miss.
    pub fn get(&self, key: &str) -> Option<Decimal> {
        let mut guard = self.inner.lock();
        let CacheState { entries, stats } = &mut *guard;

        match entries.get(key) {
            Some(entry) => match self.ttl {
                Some(ttl) if entry.inserted_at.elapsed() > ttl => {}
                _ => {
                    stats.hits += 1;
                    return Some(entry.value);
                }
            },
            None => {
                stats.misses += 1;
                return None;
            }
        }

        entries.pop(key);
        log::trace!("evicted expired cache entry: {key}");
        stats.misses += 1;
        None
    }

    /// Insert a result, evicting the least-recently-used entry when full
    pub fn put(&self, key: String, value: Decimal) {
        let mut state = self.inner.lock();
        if state.entries.len() == self.capacity && !state.entries.contains(&key) {
            log::trace!("cache full, evicting least-recently-used entry");
        }
        state.entries.put(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Check for a key without touching LRU order or counters
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Drop all entries and reset the hit/miss counters
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.stats = CacheStats::default();
    }

    /// Current number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    /// Consistent snapshot of size and counters
    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.inner.lock();
        CacheSnapshot {
            size: state.entries.len(),
            capacity: self.capacity,
            hits: state.stats.hits,
            misses: state.stats.misses,
            hit_rate: state.stats.hit_rate(),
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ResultCache")
            .field("size", &snapshot.size)
            .field("capacity", &snapshot.capacity)
            .field("hits", &snapshot.hits)
            .field("misses", &snapshot.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_basic_operations() {
        let cache = ResultCache::new(CacheConfig::default());

        assert_eq!(cache.get("a"), None);
        cache.put("a".to_string(), dec(1));
        assert_eq!(cache.get("a"), Some(dec(1)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lru_eviction_is_single_entry() {
        let cache = ResultCache::new(CacheConfig::new(2, None));

        cache.put("a".to_string(), dec(1));
        cache.put("b".to_string(), dec(2));

        // Touch "a" so "b" becomes the least recently used.
        cache.get("a");

        cache.put("c".to_string(), dec(3));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_ttl_expiry_counts_as_miss() {
        let cache = ResultCache::new(CacheConfig::new(10, Some(Duration::from_millis(20))));

        cache.put("a".to_string(), dec(1));
        assert_eq!(cache.get("a"), Some(dec(1)));

        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("a"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        // The expired entry is gone, not just hidden.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear_resets_entries_and_counters() {
        let cache = ResultCache::new(CacheConfig::default());

        cache.put("a".to_string(), dec(1));
        cache.get("a");
        cache.get("missing");

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = std::sync::Arc::new(ResultCache::new(CacheConfig::new(100, None)));
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = std::sync::Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}", (i + j) % 20);
                    cache.put(key.clone(), dec(j));
                    cache.get(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 800);
    }

    #[test]
    #[should_panic(expected = "cache capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        ResultCache::new(CacheConfig::new(0, None));
    }
}
