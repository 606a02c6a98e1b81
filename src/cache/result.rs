//! Rewrite result cache.
//!
//! [`ResultCache`] remembers the formal text produced for a (draft,
//! nature) pair so that re-submitting the same narrative in a session
//! does not pay for another remote generation.
//!
//! # Key scope
//!
//! The key is the [`Fingerprint`] of the trimmed draft and nature only.
//! Model choice and temperature are *not* part of the key, so a hit may
//! return text produced under an earlier generation configuration.
//! Call [`ResultCache::clear()`] after changing either if that matters.
//!
//! # Concurrency
//!
//! The [`LruCache`] sits behind a mutex. Each `get`, `put`, `clear` and `stats`
//! is a single critical section, so the size bound and recency order
//! hold even when rewrites run on several background tasks.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info};

use super::key::Fingerprint;
use crate::telemetry;
use crate::{EscribaError, Result};

/// Configuration for the result cache.
///
/// ```rust
/// # use escriba::CacheConfig;
/// let config = CacheConfig::new().max_entries(250);
/// assert_eq!(config.max_entries, 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached rewrites. Default: 100.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

impl CacheConfig {
    /// Create a new config with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
}

struct Inner {
    store: LruCache<Fingerprint, String>,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded, strictly-LRU cache of generated report text.
pub struct ResultCache {
    inner: Mutex<Inner>,
}

impl ResultCache {
    /// Create an empty cache.
    ///
    /// Fails with [`EscribaError::Configuration`] when `max_entries` is 0.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.max_entries).ok_or_else(|| {
            EscribaError::Configuration("cache max_entries must be at least 1".to_string())
        })?;
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a cached rewrite.
    ///
    /// A hit promotes the entry to most-recently-used. Hits and misses
    /// are both counted.
    pub fn get(&self, key: &Fingerprint) -> Option<String> {
        let mut inner = self.lock();
        match inner.store.get(key).cloned() {
            Some(text) => {
                inner.hits += 1;
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                debug!(%key, hit_rate = inner.hit_rate(), "cache hit");
                Some(text)
            }
            None => {
                inner.misses += 1;
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                debug!(%key, hit_rate = inner.hit_rate(), "cache miss");
                None
            }
        }
    }

    /// Insert or overwrite a rewrite, evicting the least-recently-used
    /// entry if a new key would exceed capacity.
    pub fn put(&self, key: Fingerprint, text: String) {
        let mut inner = self.lock();
        // `push` hands back the old pair on overwrite too; only a
        // different key means something was evicted.
        if let Some((evicted, _)) = inner.store.push(key, text)
            && evicted != key
        {
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
            debug!(%evicted, "cache eviction");
        }
    }

    /// Whether `key` is cached. Does not count as a lookup or affect recency.
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.lock().store.peek(key).is_some()
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.store.clear();
        inner.hits = 0;
        inner.misses = 0;
        info!("result cache cleared");
    }

    /// Current size, capacity, counters and hit rate.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.store.len(),
            max_size: inner.store.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: inner.hit_rate(),
        }
    }

    /// Cached keys, most-recently-used first.
    pub fn keys(&self) -> Vec<Fingerprint> {
        self.lock().store.iter().map(|(key, _)| *key).collect()
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Store mutations never panic midway, so a poisoned guard still holds
    // a consistent store.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(CacheConfig::default().max_entries);
        Self::with_capacity(capacity.unwrap_or(NonZeroUsize::MIN))
    }
}
