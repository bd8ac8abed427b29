//! Buildings-aware propagation loss model.
//!
//! Combines, for every query:
//! - the distance-dependent loss from a [`DistanceLossModel`]
//! - external wall loss (per [`ExternalWallPolicy`])
//! - internal wall loss between endpoints in the same building
//! - floor-dependent height loss of both endpoints
//! - the link's cached shadowing
//!
//! Wall and height terms are recomputed from the current positions on every
//! call because nodes move between buildings. Shadowing is drawn once per
//! link and then frozen.
//!
//! The shadowing cache sits behind a `Mutex` owned by the model: queries take
//! `&self`, and the check-then-create step for an unseen link is a single
//! critical section, so two queries racing on the same link see one value.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::config::{ConfigError, ExternalWallPolicy, ModelConfig};
use super::geometry::GeometryOracle;
use super::height_loss::height_loss;
use super::shadowing::{LinkEnvironment, ShadowingCache, ShadowingSample, evaluate_sigma};
use super::signal_calculations::DistanceLossModel;
use super::types::{Endpoint, NodeId};
use super::wall_loss::{external_wall_loss, internal_walls_loss};

/// Per-term decomposition of one link's loss, all in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossBreakdown {
    pub distance: f64,
    pub external_walls: f64,
    pub internal_walls: f64,
    pub height: f64,
    pub shadowing: f64,
}

impl LossBreakdown {
    pub fn total(&self) -> f64 {
        self.distance + self.external_walls + self.internal_walls + self.height + self.shadowing
    }
}

struct ShadowingState {
    cache: ShadowingCache,
    rng: StdRng,
}

/// Propagation loss model for nodes in and around buildings.
///
/// `L` supplies the distance-dependent term, `G` answers building questions.
pub struct BuildingsPropagationLossModel<L, G> {
    config: ModelConfig,
    distance_loss: L,
    geometry: G,
    shadowing: Mutex<ShadowingState>,
}

impl<L: DistanceLossModel, G: GeometryOracle> BuildingsPropagationLossModel<L, G> {
    /// Build a model after validating `config`.
    ///
    /// The shadowing cache starts empty.
    pub fn new(config: ModelConfig, distance_loss: L, geometry: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        log::info!(
            "Buildings propagation model ready: sigma indoor/outdoor/external = {}/{}/{} dB, internal wall {} dB, {:?}",
            config.shadowing_sigma_indoor,
            config.shadowing_sigma_outdoor,
            config.shadowing_sigma_external_walls,
            config.internal_wall_loss,
            config.external_wall_policy
        );
        Ok(Self {
            config,
            distance_loss,
            geometry,
            shadowing: Mutex::new(ShadowingState {
                cache: ShadowingCache::new(),
                rng,
            }),
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn distance_loss(&self) -> &L {
        &self.distance_loss
    }

    fn lock_shadowing(&self) -> MutexGuard<'_, ShadowingState> {
        // The cache has no invariant a panicking holder could break halfway.
        self.shadowing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn external_wall_loss(&self, endpoint: &Endpoint) -> f64 {
        external_wall_loss(&self.geometry, endpoint)
    }

    pub fn internal_walls_loss(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        internal_walls_loss(&self.geometry, a, b, self.config.internal_wall_loss)
    }

    pub fn height_loss(&self, endpoint: &Endpoint) -> f64 {
        height_loss(&self.geometry, &self.config.height_loss, endpoint)
    }

    pub fn link_environment(&self, a: &Endpoint, b: &Endpoint) -> LinkEnvironment {
        LinkEnvironment::classify(&self.geometry, a, b)
    }

    pub fn evaluate_sigma(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        evaluate_sigma(&self.geometry, &self.config, a, b)
    }

    /// Shadowing of the link between `a` and `b` (dB).
    ///
    /// The first query for a link draws from `Normal(mean, sigma)` with the
    /// sigma of the link's current environment; every later query, in either
    /// direction, returns that same value.
    pub fn get_shadowing(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        let sigma = self.evaluate_sigma(a, b);
        let mean = self.config.shadowing_mean;
        let mut guard = self.lock_shadowing();
        let ShadowingState { cache, rng } = &mut *guard;
        let sample = cache.get_or_realize(a.node_id, b.node_id, || {
            let sample = ShadowingSample::realize(mean, sigma, b.node_id, rng);
            log::debug!(
                "Realized shadowing {:.3} dB for link {}-{} (mean {}, sigma {})",
                sample.value(),
                a.node_id,
                b.node_id,
                mean,
                sigma
            );
            sample
        });
        sample.value()
    }

    /// Stored shadowing sample for the link, without realizing one.
    pub fn cached_shadowing(&self, a: NodeId, b: NodeId) -> Option<ShadowingSample> {
        self.lock_shadowing().cache.get(a, b).copied()
    }

    /// Number of links with a realized shadowing sample.
    pub fn shadowing_sample_count(&self) -> usize {
        self.lock_shadowing().cache.len()
    }

    /// Realized links of `node` as `(partner, sample)`, ordered by partner id.
    pub fn shadowing_row(&self, node: NodeId) -> Vec<(NodeId, ShadowingSample)> {
        self.lock_shadowing().cache.row(node)
    }

    /// Drop every realized link of `node`; its next queries draw fresh samples.
    pub fn forget_endpoint(&self, node: NodeId) -> usize {
        let removed = self.lock_shadowing().cache.forget(node);
        log::debug!("Forgot {} shadowing links of node {}", removed, node);
        removed
    }

    /// Drop every realized sample.
    pub fn reset_shadowing(&self) {
        let mut guard = self.lock_shadowing();
        let count = guard.cache.len();
        guard.cache.clear();
        log::info!("Shadowing cache reset ({} links dropped)", count);
    }

    /// External wall term for a link with `b` as the receiver.
    fn external_walls_term(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        match self.config.external_wall_policy {
            ExternalWallPolicy::SumBoth => self.external_wall_loss(a) + self.external_wall_loss(b),
            ExternalWallPolicy::ReceiverOnly => self.external_wall_loss(b),
        }
    }

    /// Every loss term of the link from `a` to `b`, realizing its shadowing if needed.
    pub fn loss_breakdown(&self, a: &Endpoint, b: &Endpoint) -> LossBreakdown {
        let breakdown = LossBreakdown {
            distance: self.distance_loss.get_loss(a, b),
            external_walls: self.external_walls_term(a, b),
            internal_walls: self.internal_walls_loss(a, b),
            height: self.height_loss(a) + self.height_loss(b),
            shadowing: self.get_shadowing(a, b),
        };
        log::trace!("Loss {}->{}: {:?}", a.node_id, b.node_id, breakdown);
        breakdown
    }

    /// Total loss (dB) of the link from `a` to `b`.
    pub fn total_loss(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        self.loss_breakdown(a, b).total()
    }

    /// Received power (dBm) at `b` for a transmission of `tx_power_dbm` from `a`.
    pub fn calc_rx_power(&self, tx_power_dbm: f64, a: &Endpoint, b: &Endpoint) -> f64 {
        tx_power_dbm - self.total_loss(a, b)
    }
}
