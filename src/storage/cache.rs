//! LRU cache with per-entry expiry.

use super::lock;
use crate::model::Document;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Entries dropped because their TTL ran out
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Share of lookups that hit, or 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Trait for document caches.
pub trait DocumentCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<Document>>;

    /// Insert or replace; `ttl` overrides the cache default.
    fn put(&self, key: &str, doc: Document, ttl: Option<Duration>);

    /// Returns whether the key was present.
    fn remove(&self, key: &str) -> bool;

    fn clear(&self);

    fn stats(&self) -> CacheStats;
}

struct Entry {
    doc: Arc<Document>,
    expires_at: Option<Instant>,
    /// Recency stamp, key into `CacheState::recency`
    tick: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Entry>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    stats: CacheStats,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn drop_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.recency.remove(&entry.tick);
                true
            }
            None => false,
        }
    }
}

/// Least-recently-used cache of layered documents.
///
/// One lock covers every operation.
pub struct LruCache {
    capacity: usize,
    default_ttl: Option<Duration>,
    state: Mutex<CacheState>,
}

impl LruCache {
    /// Create a cache holding at most `capacity` documents (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let state = CacheState {
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
            ..Default::default()
        };
        Self {
            capacity,
            default_ttl: None,
            state: Mutex::new(state),
        }
    }

    /// Expire entries after `ttl` unless `put` says otherwise.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl DocumentCache for LruCache {
    fn get(&self, key: &str) -> Option<Arc<Document>> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let expired = match state.entries.get(key) {
            None => {
                state.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at.is_some_and(|at| Instant::now() >= at),
        };
        if expired {
            state.drop_entry(key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            state.stats.size = state.entries.len();
            return None;
        }
        state.touch(key);
        state.stats.hits += 1;
        state.entries.get(key).map(|entry| entry.doc.clone())
    }

    fn put(&self, key: &str, doc: Document, ttl: Option<Duration>) {
        let expires_at = ttl.or(self.default_ttl).map(|ttl| Instant::now() + ttl);
        let mut state = lock(&self.state);
        state.drop_entry(key);
        while state.entries.len() >= self.capacity {
            let Some((_, oldest)) = state.recency.pop_first() else {
                break;
            };
            state.entries.remove(&oldest);
            state.stats.evictions += 1;
            log::debug!("Cache evicted '{}'", oldest);
        }
        let tick = state.next_tick;
        state.next_tick += 1;
        state.recency.insert(tick, key.to_string());
        state.entries.insert(
            key.to_string(),
            Entry {
                doc: Arc::new(doc),
                expires_at,
                tick,
            },
        );
        state.stats.size = state.entries.len();
    }

    fn remove(&self, key: &str) -> bool {
        let mut state = lock(&self.state);
        let removed = state.drop_entry(key);
        state.stats.size = state.entries.len();
        removed
    }

    fn clear(&self) {
        let mut state = lock(&self.state);
        state.entries.clear();
        state.recency.clear();
        state.stats.size = 0;
    }

    fn stats(&self) -> CacheStats {
        lock(&self.state).stats
    }
}

impl std::fmt::Debug for LruCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats())
            .finish()
    }
}
