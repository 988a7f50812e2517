//! Single-owner contribution cache.

use std::cell::Cell;
use std::collections::HashMap;

use super::{CacheStats, ContributionCache, ContributionKey};

/// In-memory cache for one design session on one thread.
///
/// # Example
/// ```
/// use ppfd_rust::cache::{ContributionCache, LocalContributionCache};
/// use ppfd_rust::core::{LightSource, Point};
///
/// let mut cache = LocalContributionCache::new();
/// let fixture = LightSource::new(1, Point::new(1.0, 1.0), 2.0, 800.0);
/// let first = cache.get_or_compute(&fixture, Point::new(1.0, 1.0));
/// let second = cache.get_or_compute(&fixture, Point::new(1.0, 1.0));
/// assert_eq!(first, second);
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct LocalContributionCache {
    entries: HashMap<ContributionKey, f64>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl LocalContributionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContributionCache for LocalContributionCache {
    fn get(&self, key: &ContributionKey) -> Option<f64> {
        let value = self.entries.get(key).copied();
        match value {
            Some(_) => self.hits.set(self.hits.get() + 1),
            None => self.misses.set(self.misses.get() + 1),
        }
        value
    }

    fn put(&mut self, key: ContributionKey, value: f64) {
        self.entries.insert(key, value);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.hits.set(0);
        self.misses.set(0);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            entries: self.entries.len(),
        }
    }
}
