//! Size-bounded metadata cache with per-entry TTL

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use moka::Expiry;
use pkgate_config::CacheSection;

/// A cached lookup outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// Serialized JSON payload for something that exists upstream
    Present(Arc<str>),
    /// Upstream confirmed the thing does not exist
    Absent,
}

impl CachedValue {
    /// Bytes this value accounts for against the size bound
    fn weight(&self) -> usize {
        match self {
            CachedValue::Present(json) => json.len(),
            CachedValue::Absent => 0,
        }
    }
}

/// Stored value plus the TTL it was inserted with
#[derive(Debug, Clone)]
struct CacheSlot {
    value: CachedValue,
    ttl: Duration,
}

/// Expires each slot after its own TTL, restarting the clock on overwrite
struct SlotExpiry;

impl Expiry<String, CacheSlot> for SlotExpiry {
    fn expire_after_create(&self, _key: &String, slot: &CacheSlot, _created_at: Instant) -> Option<Duration> {
        Some(slot.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &CacheSlot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(slot.ttl)
    }
}

/// Size bound and TTLs of a [`ResponseCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Upper bound on key plus payload bytes across all entries
    pub max_bytes: u64,
    /// Lifetime of a present entry
    pub positive_ttl: Duration,
    /// Lifetime of an absent entry
    pub negative_ttl: Duration,
}

impl CachePolicy {
    pub fn from_config(config: &CacheSection) -> Self {
        Self {
            max_bytes: config.max_bytes,
            positive_ttl: config.positive_ttl(),
            negative_ttl: config.negative_ttl(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from_config(&CacheSection::default())
    }
}

/// Concurrent, byte-bounded LRU cache shared by all in-flight lookups.
///
/// Entries expire after their own TTL even when the size bound is never
/// reached; an expired entry reads as absent from the cache.
pub struct ResponseCache {
    entries: Cache<String, CacheSlot>,
    policy: CachePolicy,
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create new cache with the given policy
    pub fn new(policy: CachePolicy) -> Self {
        let entries = Cache::builder()
            .max_capacity(policy.max_bytes)
            .weigher(|key: &String, slot: &CacheSlot| -> u32 {
                u32::try_from(key.len() + slot.value.weight()).unwrap_or(u32::MAX)
            })
            .expire_after(SlotExpiry)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            entries,
            policy,
            hits: AtomicU64::new(0),
            negative_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheSection) -> Self {
        Self::new(CachePolicy::from_config(config))
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up a key. `None` means nothing usable is cached for it.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        match self.entries.get(key) {
            Some(slot) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                if slot.value == CachedValue::Absent {
                    self.negative_hits.fetch_add(1, Ordering::Relaxed);
                }
                Some(slot.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value with an explicit TTL, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) {
        self.entries.insert(key.into(), CacheSlot { value, ttl });
    }

    /// Store a serialized payload with the positive TTL
    pub fn insert_present(&self, key: impl Into<String>, json: impl Into<Arc<str>>) {
        self.set(key, CachedValue::Present(json.into()), self.policy.positive_ttl);
    }

    /// Record a confirmed absence with the negative TTL
    pub fn insert_absent(&self, key: impl Into<String>) {
        self.set(key, CachedValue::Absent, self.policy.negative_ttl);
    }

    /// Drop one entry
    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();

        CacheStats {
            entries: self.entries.entry_count(),
            weighted_bytes: self.entries.weighted_size(),
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("policy", &self.policy)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Live entries
    pub entries: u64,
    /// Sum of entry weights in bytes
    pub weighted_bytes: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Hits that were recorded absences
    pub negative_hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}
