//! Bounded, expiring cache of compiled line templates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tintlog_core::Level;

use crate::detection::OutputTarget;

use super::presets::Preset;

pub const DEFAULT_CAPACITY: usize = 128;
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Everything a compiled template depends on.
///
/// `appearance` is a hash of the full style config and theme, so templates
/// compiled from different settings never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub level: Level,
    pub theme: String,
    pub appearance: u64,
    pub has_prefix: bool,
    pub has_location: bool,
    pub preset: Option<Preset>,
    pub target: OutputTarget,
}

/// Counters reported by [`StyleCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hits over lookups, 0.0 before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: Arc<V>,
    inserted: Instant,
    touched: u64,
}

/// LRU cache with a per-entry time-to-live.
///
/// Expiry counts from insertion; a hit refreshes recency but not age.
pub struct StyleCache<V> {
    entries: HashMap<StyleKey, Entry<V>>,
    capacity: usize,
    ttl: Duration,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Default for StyleCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl<V> std::fmt::Debug for StyleCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleCache")
            .field("stats", &self.stats())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<V> StyleCache<V> {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            ttl,
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn get(&mut self, key: &StyleKey) -> Option<Arc<V>> {
        self.get_at(key, Instant::now())
    }

    /// Look up a key as of `now`. Expired entries are removed and count as misses.
    pub fn get_at(&mut self, key: &StyleKey, now: Instant) -> Option<Arc<V>> {
        self.clock += 1;
        let clock = self.clock;
        let expired = match self.entries.get_mut(key) {
            Some(entry) if now.saturating_duration_since(entry.inserted) < self.ttl => {
                entry.touched = clock;
                self.hits += 1;
                return Some(Arc::clone(&entry.value));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        self.misses += 1;
        None
    }

    pub fn insert(&mut self, key: StyleKey, value: Arc<V>) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: StyleKey, value: Arc<V>, now: Instant) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one(now);
        }
        self.entries.insert(
            key,
            Entry {
                value,
                inserted: now,
                touched: self.clock,
            },
        );
    }

    // Drop expired entries first; otherwise the least recently touched one.
    fn evict_one(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.inserted) < ttl);
        if self.entries.len() < before {
            self.evictions += (before - self.entries.len()) as u64;
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.touched)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
