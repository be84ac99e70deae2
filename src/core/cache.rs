use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::Result;
use crate::stats::{CacheSnapshot, CacheStatistics};

/// Generational cache
///
/// Lookups probe the `active` generation. Every access also records the key in the
/// `background` generation; once `background` holds `capacity` keys and a new one
/// arrives, the cache switches: `background` becomes `active` and a fresh empty
/// `background` starts filling. Keys not touched for a whole generation are dropped.
///
/// Both generations are published through one `ArcSwap`, so hits on keys already
/// recorded never lock. Adding a key to `background` takes the switch lock, which
/// keeps `background` at or below `capacity`.
pub struct Cache<K, V> {
    capacity: usize,
    generations: ArcSwap<Generations<K, V>>,
    // Taken when a key joins the background generation
    switch_lock: Mutex<()>,
    stats: CacheStatistics,
}

struct Generations<K, V> {
    active: Arc<DashMap<K, Arc<V>>>,
    background: Arc<DashMap<K, Arc<V>>>,
}

impl<K: Hash + Eq, V> Generations<K, V> {
    fn empty(capacity: usize) -> Self {
        Self {
            active: Arc::new(DashMap::with_capacity(capacity)),
            background: Arc::new(DashMap::with_capacity(capacity)),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Copy + fmt::Debug,
{
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            generations: ArcSwap::from_pointee(Generations::empty(capacity)),
            switch_lock: Mutex::new(()),
            stats: CacheStatistics::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value for `key`, loading and caching it on a miss.
    ///
    /// Two threads missing on the same key may both load it; the last insert wins
    /// and both results hold the same content.
    pub fn get_or_load<F>(&self, key: K, load: F) -> Result<Arc<V>>
    where
        F: FnOnce(K) -> Result<V>,
    {
        self.stats.record_request();

        let generations = self.generations.load();
        if let Some(value) = generations.active.get(&key).map(|e| Arc::clone(e.value())) {
            self.add_recent(&generations, key, &value);
            return Ok(value);
        }

        self.stats.record_miss();
        let value = Arc::new(load(key)?);
        generations.active.insert(key, Arc::clone(&value));
        self.add_recent(&generations, key, &value);
        Ok(value)
    }

    /// Value for `key` if it is in the active generation. Does not touch counters.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.generations
            .load()
            .active
            .get(key)
            .map(|e| Arc::clone(e.value()))
    }

    /// Record `key` as recently used, switching generations when the background is full
    fn add_recent(&self, generations: &Generations<K, V>, key: K, value: &Arc<V>) {
        if generations.background.contains_key(&key) {
            return;
        }

        let _lock = self.switch_lock.lock();

        // Another thread may have filled or switched the background while we waited
        let current = self.generations.load_full();
        if current.background.contains_key(&key) {
            return;
        }
        if current.background.len() < self.capacity {
            current.background.insert(key, Arc::clone(value));
            return;
        }

        let next = Generations {
            active: Arc::clone(&current.background),
            background: Arc::new(DashMap::with_capacity(self.capacity)),
        };
        next.active.insert(key, Arc::clone(value));
        next.background.insert(key, Arc::clone(value));
        self.generations.store(Arc::new(next));

        self.stats.record_switch();
        tracing::trace!(?key, capacity = self.capacity, "cache switched generation");
    }

    #[cfg(test)]
    pub(crate) fn background_len(&self) -> usize {
        self.generations.load().background.len()
    }

    /// Number of entries in the active generation
    pub fn len(&self) -> usize {
        self.generations.load().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> &CacheStatistics {
        &self.stats
    }

    pub fn stats(&self) -> CacheSnapshot {
        self.stats.snapshot(self.len())
    }

    /// Drop every cached entry and zero the counters
    pub fn reset(&self) {
        let _lock = self.switch_lock.lock();
        self.generations
            .store(Arc::new(Generations::empty(self.capacity)));
        self.stats.reset();
    }
}
