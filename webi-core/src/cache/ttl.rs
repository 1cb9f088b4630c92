//! Bounded TTL cache with LRU eviction and stale serving

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Settings for one cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of entries before the least recently used is evicted
    pub max_entries: usize,

    /// Time after which an entry is no longer fresh
    pub ttl: Duration,

    /// Keep expired entries around so they can be served when a refresh fails
    pub allow_stale: bool,

    /// A fresh hit restarts the entry's TTL
    pub update_age_on_get: bool,
}

impl CacheOptions {
    /// Options with stale serving and age-on-get enabled
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries,
            ttl,
            allow_stale: true,
            update_age_on_get: true,
        }
    }

    pub fn with_allow_stale(mut self, allow_stale: bool) -> Self {
        self.allow_stale = allow_stale;
        self
    }

    pub fn with_update_age_on_get(mut self, update_age_on_get: bool) -> Self {
        self.update_age_on_get = update_age_on_get;
        self
    }
}

/// Result of a lookup that may return an expired value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Within its TTL
    Fresh(V),
    /// Past its TTL, kept because the cache allows stale serving
    Stale(V),
}

impl<V> Lookup<V> {
    pub fn into_inner(self) -> V {
        match self {
            Lookup::Fresh(value) | Lookup::Stale(value) => value,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Lookup::Stale(_))
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    last_access: u64,
}

struct Slots<V> {
    entries: HashMap<String, Entry<V>>,
    clock: u64,
}

impl<V> Slots<V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Key/value cache bounded by entry count, with per-entry TTL
///
/// Values are cloned out on every hit, so store cheap handles
/// (`Arc<T>`) rather than large owned values.
pub struct TtlCache<V> {
    name: &'static str,
    options: CacheOptions,
    slots: Mutex<Slots<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache; `max_entries` is clamped to at least one
    pub fn new(name: &'static str, mut options: CacheOptions) -> Self {
        options.max_entries = options.max_entries.max(1);
        Self {
            name,
            options,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn slots(&self) -> MutexGuard<'_, Slots<V>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lookup(key)? {
            Lookup::Fresh(value) => Some(value),
            Lookup::Stale(_) => None,
        }
    }

    /// Value for `key`, marking whether it has expired
    ///
    /// Expired entries are only returned when `allow_stale` is set;
    /// otherwise they are dropped on sight.
    pub fn lookup(&self, key: &str) -> Option<Lookup<V>> {
        let now = Instant::now();
        let ttl = self.options.ttl;
        let allow_stale = self.options.allow_stale;
        let update_age = self.options.update_age_on_get;

        let mut slots = self.slots();
        let tick = slots.tick();

        let entry = slots.entries.get_mut(key)?;
        if now.duration_since(entry.stored_at) < ttl {
            entry.last_access = tick;
            if update_age {
                entry.stored_at = now;
            }
            return Some(Lookup::Fresh(entry.value.clone()));
        }

        if allow_stale {
            trace!("{}: entry {} is stale", self.name, key);
            return Some(Lookup::Stale(entry.value.clone()));
        }

        trace!("{}: dropping expired entry {}", self.name, key);
        slots.entries.remove(key);
        None
    }

    /// Value for `key` regardless of age, if stale serving allows it
    pub fn get_stale(&self, key: &str) -> Option<V> {
        self.lookup(key).map(Lookup::into_inner)
    }

    /// Insert or replace `key`, evicting least recently used entries
    pub fn set(&self, key: &str, value: V) {
        let now = Instant::now();
        let max_entries = self.options.max_entries;

        let mut slots = self.slots();
        let tick = slots.tick();
        slots.entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: now,
                last_access: tick,
            },
        );

        while slots.entries.len() > max_entries {
            let victim = slots
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone());

            match victim {
                Some(victim) => {
                    trace!("{}: evicting {}", self.name, victim);
                    slots.entries.remove(&victim);
                }
                None => break,
            }
        }
    }

    /// Remove `key`; returns whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.slots().entries.remove(key).is_some()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.slots().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.slots().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max: usize, ttl_secs: u64) -> CacheOptions {
        CacheOptions::new(max, Duration::from_secs(ttl_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale() {
        let cache = TtlCache::new("test", options(4, 10));
        cache.set("a", 1);

        assert_eq!(cache.lookup("a"), Some(Lookup::Fresh(1)));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.lookup("a"), Some(Lookup::Stale(1)));
        assert_eq!(cache.get_stale("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_dropped_without_stale() {
        let cache = TtlCache::new("test", options(4, 10).with_allow_stale(false));
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.lookup("a"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_restarts_ttl() {
        let cache = TtlCache::new("test", options(4, 10));
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_keeps_ttl_when_age_update_disabled() {
        let cache = TtlCache::new("test", options(4, 10).with_update_age_on_get(false));
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TtlCache::new("test", options(2, 60));
        cache.set("a", 1);
        cache.set("b", 2);

        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get("a"), Some(1));

        cache.set("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_single_slot_replaces() {
        let cache = TtlCache::new("test", options(1, 60));
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = TtlCache::new("test", options(0, 60));
        cache.set("a", 1);
        assert_eq!(cache.options().max_entries, 1);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = TtlCache::new("test", options(4, 60));
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
