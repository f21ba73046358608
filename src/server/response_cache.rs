//! Response caching for Shopify reads with TTL-based expiration
//!
//! A process-local map from string keys to values, each tagged with an
//! absolute expiration instant. An entry is live only while `now < expires_at`;
//! expired entries are dropped lazily on lookup and eagerly by [`ExpiringCache::cleanup`].
//! Time is read through the [`Clock`] seam so expiry can be tested without sleeping.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
///
/// Clones share the same offset, so a test can keep a handle while the
/// cache owns another.
#[derive(Debug, Clone)]
pub struct MockClock {
    base: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant, ttl: Duration) -> Self {
        // An overflowing TTL behaves as "never expires" within the process lifetime
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the entry is live at `now`
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,

    /// Total cache misses
    pub misses: u64,

    /// Entries removed because they expired
    pub ttl_evictions: u64,

    /// Producer invocations from read-through lookups
    pub producer_calls: u64,

    /// Current number of stored entries (live or not yet swept)
    pub entry_count: usize,
}

impl CacheStats {
    /// Calculate hit ratio
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve reads from the cache at all
    pub enabled: bool,

    /// TTL used when a call does not supply one
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Period of the background sweep
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(300),     // 5 minutes
            cleanup_interval: Duration::from_secs(60), // 1 minute
        }
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

/// String-keyed cache with per-entry TTL
pub struct ExpiringCache<V = serde_json::Value> {
    state: Mutex<CacheState<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V> std::fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> ExpiringCache<V> {
    /// Create a cache with the default 5 minute TTL
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a cache from configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::with_clock(config.default_ttl, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
            default_ttl,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Cache mutex poisoned, recovering with potentially inconsistent state");
            poisoned.into_inner()
        })
    }

    /// Store a value with the default TTL, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL, replacing any previous entry
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(value, self.clock.now(), ttl);

        let mut state = self.lock();
        state.entries.insert(key, entry);
        state.stats.entry_count = state.entries.len();
        trace!("Cache entry stored, total entries: {}", state.entries.len());
    }

    /// Store a value with the default TTL only if `condition` holds.
    ///
    /// `condition` runs under the cache lock, so a concurrent [`clear`](Self::clear)
    /// either happens before it is evaluated or after the value is stored.
    pub fn set_if(&self, key: impl Into<String>, value: V, condition: impl FnOnce() -> bool) -> bool {
        let entry = CacheEntry::new(value, self.clock.now(), self.default_ttl);

        let mut state = self.lock();
        if !condition() {
            return false;
        }
        state.entries.insert(key.into(), entry);
        state.stats.entry_count = state.entries.len();
        true
    }

    /// Look up a live value. Expired entries are removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;

        match state.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let value = entry.value.clone();
                state.stats.hits += 1;
                return Some(value);
            }
            Some(_) => {
                state.entries.remove(key);
                state.stats.ttl_evictions += 1;
                state.stats.entry_count = state.entries.len();
                debug!("Cache entry for {} expired and removed", key);
            }
            None => {}
        }

        state.stats.misses += 1;
        None
    }

    /// Return the live value for `key`, or run `producer` and store its result.
    ///
    /// A failing producer stores nothing. Concurrent callers that miss on the
    /// same key each run their own producer; the last one to finish wins.
    pub async fn get_or_set<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_set_with_ttl(key, self.default_ttl, producer)
            .await
    }

    /// [`get_or_set`](Self::get_or_set) with an explicit TTL
    pub async fn get_or_set_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        self.lock().stats.producer_calls += 1;
        debug!("Cache miss for {}, invoking producer", key);

        let value = producer().await?;
        self.set_with_ttl(key, value.clone(), ttl);
        Ok(value)
    }

    /// Remove an entry, returning whether one was stored
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.lock();
        let removed = state.entries.remove(key).is_some();
        state.stats.entry_count = state.entries.len();
        removed
    }

    /// Remove all entries
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.stats.entry_count = 0;
        debug!("Cache cleared");
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();

        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - state.entries.len();

        if removed > 0 {
            state.stats.ttl_evictions += removed as u64;
            state.stats.entry_count = state.entries.len();
            debug!("Cache cleanup: removed {} expired entries", removed);
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a live entry exists without touching statistics
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache of raw GraphQL `data` payloads
pub type ResponseCache = ExpiringCache<serde_json::Value>;

/// Spawn a task calling [`ExpiringCache::cleanup`] every `period`.
///
/// The caller owns the handle and aborts it on shutdown.
pub fn start_cleanup_task<V>(cache: Arc<ExpiringCache<V>>, period: Duration) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let removed = cache.cleanup();
            if removed > 0 {
                trace!("Background cleanup: removed {} expired entries", removed);
            }
        }
    })
}

/// Build a cache key from an operation name and its variables.
///
/// Variables are hashed in serde_json's canonical (sorted-key) form, so
/// equal variable sets always map to the same key.
pub fn create_cache_key(operation: &str, variables: &serde_json::Value) -> String {
    let digest = Sha256::digest(variables.to_string().as_bytes());
    format!("{}:{}", operation, hex::encode(&digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn cache_with_clock() -> (ExpiringCache<String>, MockClock) {
        let clock = MockClock::new();
        let cache = ExpiringCache::with_clock(Duration::from_secs(300), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_cache_basic_operations() {
        let (cache, _) = cache_with_clock();

        cache.set("key1", "value1".to_string());
        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.get("nonexistent"), None);

        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));
        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let (cache, clock) = cache_with_clock();

        cache.set_with_ttl("key", "old".to_string(), Duration::from_millis(100));
        cache.set_with_ttl("key", "new".to_string(), Duration::from_secs(10));
        clock.advance(Duration::from_millis(200));

        assert_eq!(cache.get("key"), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_boundary() {
        let (cache, clock) = cache_with_clock();
        cache.set_with_ttl("key", "value".to_string(), Duration::from_millis(500));

        clock.advance(Duration::from_millis(499));
        assert_eq!(cache.get("key"), Some("value".to_string()));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("key"), None);
        // Lazily removed on the expired read
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        let cache: ExpiringCache<u32> = ExpiringCache::new();
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let (cache, clock) = cache_with_clock();
        cache.set_with_ttl("short", "a".to_string(), Duration::from_millis(500));
        cache.set_with_ttl("long", "b".to_string(), Duration::from_millis(2000));

        clock.advance(Duration::from_millis(501));
        assert_eq!(cache.cleanup(), 1);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some("b".to_string()));
        assert_eq!(cache.stats().ttl_evictions, 1);
    }

    #[test]
    fn test_clear() {
        let (cache, _) = cache_with_clock();
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_cache_statistics() {
        let (cache, _) = cache_with_clock();

        cache.set("key1", "value1".to_string());
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
    }

    #[tokio::test]
    async fn test_get_or_set_invokes_producer_once() {
        let (cache, _) = cache_with_clock();
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: Result<String, String> = cache
                .get_or_set("key", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok("produced".to_string()) }
                })
                .await;
            assert_eq!(value.unwrap(), "produced");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().producer_calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_set_reruns_after_expiry() {
        let (cache, clock) = cache_with_clock();
        let calls = AtomicU32::new(0);

        let produce = || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, String>(format!("value {n}")) }
        };

        let first = cache
            .get_or_set_with_ttl("key", Duration::from_secs(1), produce)
            .await
            .unwrap();
        clock.advance(Duration::from_secs(2));
        let second = cache
            .get_or_set_with_ttl("key", Duration::from_secs(1), produce)
            .await
            .unwrap();

        assert_eq!(first, "value 1");
        assert_eq!(second, "value 2");
    }

    #[tokio::test]
    async fn test_get_or_set_does_not_store_failures() {
        let (cache, _) = cache_with_clock();

        let result: Result<String, String> = cache
            .get_or_set("key", || async { Err("upstream failed".to_string()) })
            .await;

        assert_eq!(result.unwrap_err(), "upstream failed");
        assert!(!cache.contains_key("key"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_get_or_set_is_not_deduplicated() {
        let (cache, _) = cache_with_clock();
        let calls = AtomicU32::new(0);
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let producer = || {
            calls.fetch_add(1, Ordering::SeqCst);
            let mut release = release_rx.clone();
            async move {
                let _ = release.wait_for(|ready| *ready).await;
                Ok::<_, String>("value".to_string())
            }
        };

        let both = futures::future::join(
            cache.get_or_set("key", producer),
            cache.get_or_set("key", producer),
        );
        let releaser = async {
            tokio::task::yield_now().await;
            let _ = release_tx.send(true);
        };
        let ((a, b), ()) = futures::future::join(both, releaser).await;

        assert_eq!(a.unwrap(), "value");
        assert_eq!(b.unwrap(), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_periodically() {
        let (cache, clock) = cache_with_clock();
        let cache = Arc::new(cache);
        cache.set_with_ttl("short", "v".to_string(), Duration::from_millis(10));
        cache.set_with_ttl("long", "v".to_string(), Duration::from_secs(3600));

        let handle = start_cleanup_task(cache.clone(), Duration::from_millis(50));

        // Ticks before the clock moves leave both entries alone
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("long"));
        assert_eq!(cache.stats().ttl_evictions, 1);
        handle.abort();
    }

    #[test]
    fn test_set_if_respects_condition() {
        let (cache, _) = cache_with_clock();

        assert!(!cache.set_if("k", "stale".to_string(), || false));
        assert!(cache.get("k").is_none());

        assert!(cache.set_if("k", "fresh".to_string(), || true));
        assert_eq!(cache.get("k"), Some("fresh".to_string()));
    }

    #[test]
    fn test_set_if_uses_default_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set_if("k", "v".to_string(), || true);

        clock.advance(Duration::from_secs(299));
        assert!(cache.get("k").is_some());
        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_create_cache_key() {
        let params1 = json!({"first": 10, "query": "title:board"});
        let params1_reordered = json!({"query": "title:board", "first": 10});
        let params2 = json!({"first": 20, "query": "title:board"});

        let key1 = create_cache_key("products", &params1);
        let key2 = create_cache_key("products", &params2);

        assert_eq!(key1, create_cache_key("products", &params1_reordered));
        assert_ne!(key1, key2);
        assert_ne!(key1, create_cache_key("collections", &params1));
        assert!(key1.starts_with("products:"));
    }
}
