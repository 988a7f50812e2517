//! Memoization of per-point, per-fixture contributions.
//!
//! Caches are explicit objects owned by the caller (typically a design
//! session) and handed to the grid evaluator. Entries never expire: the key
//! covers the sample point, the fixture position, every radiometric input of
//! the fixture and the photometric distribution, so moving or re-aiming a
//! single fixture simply produces new keys. After bulk geometry changes the
//! owner calls [`ContributionCache::clear`] to release stale entries.
//!
//! # Implementations
//!
//! - [`LocalContributionCache`]: single-owner `HashMap`
//! - [`SharedContributionCache`]: cloneable handle over `Arc<RwLock<..>>`
//!   for hosts that evaluate candidates on several threads

pub mod local;
pub mod shared;

use serde::Serialize;

use crate::algorithms::illuminance;
use crate::core::{LightSource, Point};
use crate::models::PhotometricId;

pub use local::LocalContributionCache;
pub use shared::SharedContributionCache;

/// Bit-exact fingerprint of the inputs that shape a fixture's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RadiometricSignature {
    mounting_height: u64,
    ppf: u64,
    beam_angle: u64,
    length: Option<u64>,
    orientation: u64,
    dimming: u64,
}

impl RadiometricSignature {
    pub fn of(source: &LightSource) -> Self {
        Self {
            mounting_height: source.mounting_height.to_bits(),
            ppf: source.ppf.to_bits(),
            beam_angle: source.beam_angle.to_bits(),
            length: source.length.map(f64::to_bits),
            orientation: source.orientation_deg.to_bits(),
            dimming: source.dimming.to_bits(),
        }
    }
}

/// Cache key: (point, fixture position, radiometric signature, photometry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContributionKey {
    point: (u64, u64),
    fixture_position: (u64, u64),
    signature: RadiometricSignature,
    photometry: Option<PhotometricId>,
}

impl ContributionKey {
    pub fn new(source: &LightSource, point: Point) -> Self {
        Self {
            point: (point.x.to_bits(), point.y.to_bits()),
            fixture_position: (source.position.x.to_bits(), source.position.y.to_bits()),
            signature: RadiometricSignature::of(source),
            photometry: source.photometry.as_ref().map(|file| file.id()),
        }
    }
}

/// Hit/miss counters since creation or the last `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Storage for memoized contributions.
pub trait ContributionCache {
    fn get(&self, key: &ContributionKey) -> Option<f64>;

    fn put(&mut self, key: ContributionKey, value: f64);

    /// Drops every entry and resets the counters.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;

    /// Read-through lookup: returns the stored contribution or computes,
    /// stores and returns it. Disabled fixtures yield 0 and are not stored.
    fn get_or_compute(&mut self, source: &LightSource, point: Point) -> f64 {
        if !source.enabled {
            return 0.0;
        }
        let key = ContributionKey::new(source, point);
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = illuminance::contribution(source, point);
        self.put(key, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixtureId;

    #[test]
    fn test_key_tracks_position_and_signature() {
        let source = LightSource::new(1, Point::new(2.0, 3.0), 2.5, 900.0);
        let at = Point::new(1.0, 1.0);
        let key = ContributionKey::new(&source, at);

        assert_eq!(key, ContributionKey::new(&source.clone(), at));

        let mut moved = source.clone();
        moved.position = Point::new(2.5, 3.0);
        assert_ne!(key, ContributionKey::new(&moved, at));

        let dimmed = source.clone().with_dimming(0.5);
        assert_ne!(key, ContributionKey::new(&dimmed, at));

        assert_ne!(key, ContributionKey::new(&source, Point::new(1.0, 1.5)));
    }

    #[test]
    fn test_key_ignores_fixture_id() {
        let a = LightSource::new(1, Point::new(2.0, 3.0), 2.5, 900.0);
        let mut b = a.clone();
        b.id = FixtureId(2);
        let at = Point::new(0.0, 0.0);
        assert_eq!(ContributionKey::new(&a, at), ContributionKey::new(&b, at));
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entries: 1,
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
