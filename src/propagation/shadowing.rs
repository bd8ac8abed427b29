//! Shadowing: link classification, sigma policy and the realized-sample cache.
//!
//! Each link is shadowed by one Gaussian (in dB) draw, realized the first
//! time the link is queried and reused for the rest of the model's life.
//!
//! The cache is keyed by [`LinkKey`], the unordered node pair, so a sample
//! stored for `(a, b)` is the sample for `(b, a)`; there is only one copy to
//! keep consistent. A per-node partner index lets one node's row be listed or
//! dropped without walking every link.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use super::config::ModelConfig;
use super::geometry::GeometryOracle;
use super::types::{Endpoint, LinkKey, NodeId};

/// Environment class of a link, which selects the shadowing sigma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEnvironment {
    /// Both endpoints indoors, in the same or in different buildings.
    Indoor,
    /// Exactly one endpoint indoors: the link crosses an external wall.
    ExternalWall,
    /// Both endpoints outdoors.
    Outdoor,
}

impl LinkEnvironment {
    pub fn classify<G: GeometryOracle + ?Sized>(geometry: &G, a: &Endpoint, b: &Endpoint) -> Self {
        match (geometry.is_indoor(a), geometry.is_indoor(b)) {
            (true, true) => LinkEnvironment::Indoor,
            (false, false) => LinkEnvironment::Outdoor,
            _ => LinkEnvironment::ExternalWall,
        }
    }

    /// Configured sigma (dB) for this class.
    pub fn sigma(&self, config: &ModelConfig) -> f64 {
        match self {
            LinkEnvironment::Indoor => config.shadowing_sigma_indoor,
            LinkEnvironment::ExternalWall => config.shadowing_sigma_external_walls,
            LinkEnvironment::Outdoor => config.shadowing_sigma_outdoor,
        }
    }
}

/// Shadowing standard deviation for the link between `a` and `b`.
pub fn evaluate_sigma<G: GeometryOracle + ?Sized>(geometry: &G, config: &ModelConfig, a: &Endpoint, b: &Endpoint) -> f64 {
    LinkEnvironment::classify(geometry, a, b).sigma(config)
}

/// One realized shadowing value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowingSample {
    mean: f64,
    sigma: f64,
    value: f64,
    /// Receiver of the query that realized the sample. Lookup anchor only.
    anchor: NodeId,
}

impl ShadowingSample {
    /// Draw a sample from `Normal(mean, sigma)`.
    pub fn realize<R: Rng + ?Sized>(mean: f64, sigma: f64, anchor: NodeId, rng: &mut R) -> Self {
        let value = match Normal::new(mean, sigma) {
            Ok(normal) => normal.sample(rng),
            Err(e) => {
                // Config validation keeps sigma finite and non-negative.
                debug_assert!(false, "invalid shadowing distribution: {e}");
                log::error!("Invalid shadowing distribution N({}, {}): {}; using the mean", mean, sigma, e);
                mean
            }
        };
        Self { mean, sigma, value, anchor }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Realized shadowing loss in dB.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }
}

/// Realized shadowing samples keyed by unordered node pair.
#[derive(Debug, Default)]
pub struct ShadowingCache {
    samples: HashMap<LinkKey, ShadowingSample>,
    partners: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl ShadowingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: NodeId, b: NodeId) -> Option<&ShadowingSample> {
        self.samples.get(&LinkKey::new(a, b))
    }

    /// Stored sample for the pair, or the one produced by `realize` on first use.
    ///
    /// `realize` runs at most once per unordered pair over the cache's life.
    pub fn get_or_realize<F>(&mut self, a: NodeId, b: NodeId, realize: F) -> ShadowingSample
    where
        F: FnOnce() -> ShadowingSample,
    {
        match self.samples.entry(LinkKey::new(a, b)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                // Only stored samples are indexed.
                let sample = *entry.insert(realize());
                self.partners.entry(a).or_default().insert(b);
                self.partners.entry(b).or_default().insert(a);
                debug_assert!(self.is_indexed(a, b), "partner index out of sync for {}-{}", a, b);
                sample
            }
        }
    }

    fn is_indexed(&self, a: NodeId, b: NodeId) -> bool {
        let has = |x: NodeId, y: NodeId| self.partners.get(&x).is_some_and(|set| set.contains(&y));
        has(a, b) && has(b, a)
    }

    /// Number of realized links.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All links of `node` with their samples, ordered by partner id.
    pub fn row(&self, node: NodeId) -> Vec<(NodeId, ShadowingSample)> {
        let Some(partners) = self.partners.get(&node) else {
            return Vec::new();
        };
        partners
            .iter()
            .filter_map(|&partner| self.samples.get(&LinkKey::new(node, partner)).map(|s| (partner, *s)))
            .collect()
    }

    /// Drop every link of `node`. Returns the number of links removed.
    pub fn forget(&mut self, node: NodeId) -> usize {
        let Some(partners) = self.partners.remove(&node) else {
            return 0;
        };
        let mut removed = 0;
        for partner in partners {
            if self.samples.remove(&LinkKey::new(node, partner)).is_some() {
                removed += 1;
            }
            if partner != node {
                if let Some(set) = self.partners.get_mut(&partner) {
                    set.remove(&node);
                    if set.is_empty() {
                        self.partners.remove(&partner);
                    }
                }
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.partners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::building::{Building, BuildingBounds, ExternalWallType};
    use crate::propagation::geometry::BuildingMap;
    use crate::propagation::types::Position;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn map() -> BuildingMap {
        let bounds = |x_min: f64| BuildingBounds {
            x_min,
            x_max: x_min + 10.0,
            y_min: 0.0,
            y_max: 10.0,
            z_min: 0.0,
            z_max: 3.0,
        };
        BuildingMap::new(vec![
            Building::new(1, bounds(0.0), ExternalWallType::Wood),
            Building::new(2, bounds(50.0), ExternalWallType::Wood),
        ])
        .unwrap()
    }

    fn config() -> ModelConfig {
        ModelConfig {
            shadowing_sigma_indoor: 4.0,
            shadowing_sigma_outdoor: 6.0,
            shadowing_sigma_external_walls: 9.0,
            ..ModelConfig::default()
        }
    }

    fn ep(id: u32, x: f64) -> Endpoint {
        Endpoint::new(id, Position::new(x, 5.0, 1.0))
    }

    #[test]
    fn sigma_classification_covers_all_categories() {
        let m = map();
        let c = config();
        let indoor_a = ep(1, 5.0);
        let indoor_same = ep(2, 6.0);
        let indoor_other = ep(3, 55.0);
        let outdoor_a = ep(4, 30.0);
        let outdoor_b = ep(5, 35.0);

        let cases = [
            (indoor_a, indoor_same, 4.0),
            (indoor_a, indoor_other, 4.0),
            (indoor_a, outdoor_a, 9.0),
            (outdoor_a, outdoor_b, 6.0),
        ];
        for (a, b, expected) in cases {
            assert_eq!(evaluate_sigma(&m, &c, &a, &b), expected);
            assert_eq!(evaluate_sigma(&m, &c, &b, &a), expected);
            assert_eq!(LinkEnvironment::classify(&m, &a, &b), LinkEnvironment::classify(&m, &b, &a));
        }
    }

    #[test]
    fn zero_sigma_realizes_the_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = ShadowingSample::realize(1.5, 0.0, 7, &mut rng);
        assert_eq!(sample.value(), 1.5);
        assert_eq!(sample.anchor(), 7);
    }

    #[test]
    fn realize_runs_once_per_unordered_pair() {
        let mut cache = ShadowingCache::new();
        let mut rng = StdRng::seed_from_u64(42);
        let mut draws = 0;

        let first = cache.get_or_realize(1, 2, || {
            draws += 1;
            ShadowingSample::realize(0.0, 8.0, 2, &mut rng)
        });
        let reverse = cache.get_or_realize(2, 1, || {
            draws += 1;
            ShadowingSample::realize(0.0, 8.0, 1, &mut rng)
        });
        assert_eq!(draws, 1);
        assert_eq!(first.value().to_bits(), reverse.value().to_bits());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(2, 1).map(|s| s.value()), Some(first.value()));
    }

    #[test]
    fn row_and_forget_use_partner_index() {
        let mut cache = ShadowingCache::new();
        let mut rng = StdRng::seed_from_u64(3);
        for (a, b) in [(1, 2), (1, 3), (3, 2), (4, 1)] {
            cache.get_or_realize(a, b, || ShadowingSample::realize(0.0, 5.0, b, &mut rng));
        }
        let row: Vec<NodeId> = cache.row(1).into_iter().map(|(p, _)| p).collect();
        assert_eq!(row, vec![2, 3, 4]);

        assert_eq!(cache.forget(1), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(3, 2).is_some());
        assert!(cache.row(1).is_empty());
        assert!(cache.row(4).is_empty());
        assert_eq!(cache.forget(1), 0);
    }

    #[test]
    fn self_link_is_cached_and_forgettable() {
        let mut cache = ShadowingCache::new();
        let mut rng = StdRng::seed_from_u64(5);
        cache.get_or_realize(9, 9, || ShadowingSample::realize(0.0, 5.0, 9, &mut rng));
        assert_eq!(cache.row(9).len(), 1);
        assert_eq!(cache.forget(9), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn panicking_realize_leaves_cache_untouched() {
        let mut cache = ShadowingCache::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_realize(1, 2, || panic!("generator failure"));
        }));
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert!(cache.row(1).is_empty());
        assert!(cache.row(2).is_empty());
        assert_eq!(cache.forget(1), 0);

        let mut rng = StdRng::seed_from_u64(11);
        let sample = cache.get_or_realize(1, 2, || ShadowingSample::realize(0.0, 5.0, 2, &mut rng));
        assert_eq!(cache.row(1), vec![(2, sample)]);
    }

    #[test]
    fn clear_empties_everything() {
        let mut cache = ShadowingCache::new();
        let mut rng = StdRng::seed_from_u64(5);
        cache.get_or_realize(1, 2, || ShadowingSample::realize(0.0, 5.0, 2, &mut rng));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.row(1).is_empty());
    }
}
