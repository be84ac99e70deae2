use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by each generational cache
#[derive(Debug, Default)]
pub struct CacheStatistics {
    pub requests: AtomicU64,
    pub misses: AtomicU64,
    pub switches: AtomicU64,
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache request
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a generation switch
    pub fn record_switch(&self) {
        self.switches.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of requests that missed, 0 when nothing was requested
    pub fn percentage_misses(&self) -> f64 {
        let requests = self.requests.load(Ordering::Relaxed);
        if requests > 0 {
            self.misses.load(Ordering::Relaxed) as f64 / requests as f64
        } else {
            0.0
        }
    }

    pub fn snapshot(&self, entries: usize) -> CacheSnapshot {
        CacheSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            switches: self.switches.load(Ordering::Relaxed),
            percentage_misses: self.percentage_misses(),
            entries,
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.switches.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of one cache at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheSnapshot {
    pub requests: u64,
    pub misses: u64,
    pub switches: u64,
    pub percentage_misses: f64,
    /// Entries in the active generation
    pub entries: usize,
}

/// Snapshot of a whole data set
#[derive(Debug, Clone)]
pub struct DataSetStats {
    pub strings: CacheSnapshot,
    pub nodes: CacheSnapshot,
    pub values: CacheSnapshot,
    pub profiles: CacheSnapshot,
    pub signatures: CacheSnapshot,

    // Reader pool
    pub readers_created: usize,
    pub readers_queued: usize,
}

impl DataSetStats {
    /// Total requests across all cached lists
    pub fn total_requests(&self) -> u64 {
        self.caches().iter().map(|(_, c)| c.requests).sum()
    }

    /// Total misses across all cached lists
    pub fn total_misses(&self) -> u64 {
        self.caches().iter().map(|(_, c)| c.misses).sum()
    }

    fn caches(&self) -> [(&'static str, &CacheSnapshot); 5] {
        [
            ("Strings", &self.strings),
            ("Nodes", &self.nodes),
            ("Values", &self.values),
            ("Profiles", &self.profiles),
            ("Signatures", &self.signatures),
        ]
    }

    /// Format statistics as a human-readable string
    pub fn format(&self) -> String {
        let mut out = String::from("=== uadb Statistics ===\nCaches:\n");
        for (name, cache) in self.caches() {
            out.push_str(&format!(
                "- {}: {} requests, {} misses ({:.1}%), {} switches, {} entries\n",
                name,
                cache.requests,
                cache.misses,
                cache.percentage_misses * 100.0,
                cache.switches,
                cache.entries
            ));
        }
        out.push_str(&format!(
            "\nReader Pool:\n\
            - Created: {}\n\
            - Idle: {}",
            self.readers_created, self.readers_queued
        ));
        out
    }
}
