//! Propagation loss for nodes in and around buildings.
//!
//! ## Module Organization
//!
//! - `types`: Node ids, positions, endpoints and the unordered link key
//! - `building`: Building boxes, wall materials, floor/room location
//! - `geometry`: The `GeometryOracle` contract and the `BuildingMap` oracle
//! - `signal_calculations`: Distance-dependent loss models and dBm helpers
//! - `wall_loss`: External and internal wall penetration loss
//! - `height_loss`: Floor-dependent loss
//! - `shadowing`: Sigma policy and the realized-shadowing cache
//! - `config`: Model configuration and validation
//! - `buildings_model`: The composite model combining all terms
//!
//! The main entry point is [`BuildingsPropagationLossModel::calc_rx_power`].

pub mod building;
pub mod buildings_model;
pub mod config;
pub mod geometry;
pub mod height_loss;
pub mod shadowing;
pub mod signal_calculations;
pub mod types;
pub mod wall_loss;

pub use building::{Building, BuildingBounds, ExternalWallType};
pub use buildings_model::{BuildingsPropagationLossModel, LossBreakdown};
pub use config::{ConfigError, ExternalWallPolicy, HeightLossProfile, ModelConfig};
pub use geometry::{BuildingMap, GeometryOracle};
pub use shadowing::{LinkEnvironment, ShadowingCache, ShadowingSample};
pub use signal_calculations::{DistanceLossModel, PathLossModel};
pub use types::{Endpoint, LinkKey, NodeId, Position};
