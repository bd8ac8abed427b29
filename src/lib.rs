//! Buildings-aware radio propagation loss.
//!
//! Models the non-distance-dependent part of the attenuation between two
//! nodes in or near buildings: per-link shadowing, external and internal wall
//! penetration loss and floor-dependent height loss. The distance-dependent
//! term is delegated to a [`propagation::DistanceLossModel`].

pub mod common;
pub mod propagation;
