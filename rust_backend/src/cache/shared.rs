//! Thread-safe contribution cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::{CacheStats, ContributionCache, ContributionKey};

#[derive(Debug, Default)]
struct Inner {
    entries: RwLock<HashMap<ContributionKey, f64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cloneable handle to one cache shared between threads.
///
/// Every clone sees the same entries and counters. A poisoned lock is
/// recovered: the map only ever holds fully written values.
#[derive(Debug, Clone, Default)]
pub struct SharedContributionCache {
    inner: Arc<Inner>,
}

impl SharedContributionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts through a shared reference, for use from worker threads.
    pub fn insert(&self, key: ContributionKey, value: f64) {
        self.inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    pub fn reset(&self) {
        self.inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.hits.store(0, Ordering::Relaxed);
        self.inner.misses.store(0, Ordering::Relaxed);
    }
}

impl ContributionCache for SharedContributionCache {
    fn get(&self, key: &ContributionKey) -> Option<f64> {
        let value = self
            .inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied();
        let counter = if value.is_some() {
            &self.inner.hits
        } else {
            &self.inner.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    fn put(&mut self, key: ContributionKey, value: f64) {
        self.insert(key, value);
    }

    fn clear(&mut self) {
        self.reset();
    }

    fn len(&self) -> usize {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::illuminance;
    use crate::core::{LightSource, Point};
    use std::thread;

    #[test]
    fn test_clones_share_entries() {
        let mut a = SharedContributionCache::new();
        let mut b = a.clone();
        let fixture = LightSource::new(1, Point::new(1.0, 1.0), 2.0, 500.0);
        let at = Point::new(2.0, 2.0);

        let value = a.get_or_compute(&fixture, at);
        assert_eq!(b.get_or_compute(&fixture, at), value);
        assert_eq!(b.stats().hits, 1);
        assert_eq!(a.len(), 1);

        b.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_concurrent_fill() {
        let cache = SharedContributionCache::new();
        let fixture = LightSource::new(1, Point::new(5.0, 5.0), 2.0, 900.0);

        let handles: Vec<_> = (0..4)
            .map(|row| {
                let mut cache = cache.clone();
                let fixture = fixture.clone();
                thread::spawn(move || {
                    for col in 0..25 {
                        let at = Point::new(col as f64 * 0.4, row as f64);
                        let value = cache.get_or_compute(&fixture, at);
                        assert_eq!(value, illuminance::contribution(&fixture, at));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 100);
        assert_eq!(cache.stats().misses, 100);
    }
}
