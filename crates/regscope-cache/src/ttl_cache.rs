use crate::{CacheConfig, CacheEntry, CacheStats};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Concurrent cache whose entries expire independently after their TTL.
///
/// Writers never coordinate: two tasks that miss on the same key may both
/// populate it, and the later write wins.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    entries: Arc<DashMap<K, CacheEntry<V>>>,
    config: CacheConfig,
    stats: Arc<Mutex<CacheStats>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Clone of the live value for `key`. Expired entries are dropped on the way.
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.lock().hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.entries.remove_if(key, |_, e| e.is_expired()).is_some() {
            self.stats.lock().evictions += 1;
        }
        self.stats.lock().misses += 1;
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let ttl = self.config.default_ttl;
        self.insert_with_ttl(key, value, ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.make_room();
        }
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            self.stats.lock().evictions += purged as u64;
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.entries = self.entries.len();
        stats
    }

    fn make_room(&self) {
        if self.purge_expired() > 0 && self.entries.len() < self.config.max_entries {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.lock().evictions += 1;
            debug!(capacity = self.config.max_entries, "Evicted oldest cache entry");
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
