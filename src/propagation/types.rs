//! Type definitions shared by the propagation model.
//!
//! Contains:
//! - Node identity and 3D positions
//! - The `Endpoint` snapshot passed into every loss query
//! - The canonical unordered pair key used by the shadowing cache

use serde::Deserialize;

/// Identity of a mobility-tracked node.
pub type NodeId = u32;

/// Position in world coordinates (meters). `z` is height above ground.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other` in meters.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One side of a propagation query: who the node is and where it is now.
///
/// Shadowing is keyed by `node_id` only, so a node keeps its realized
/// shadowing towards a peer while it moves. Building facts are looked up
/// from `position` on every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub node_id: NodeId,
    pub position: Position,
}

impl Endpoint {
    pub fn new(node_id: NodeId, position: Position) -> Self {
        Self { node_id, position }
    }
}

/// Unordered pair of node ids with the smaller id first.
///
/// `LinkKey::new(a, b) == LinkKey::new(b, a)` for all `a`, `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    low: NodeId,
    high: NodeId,
}

impl LinkKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self { low: a, high: b } } else { Self { low: b, high: a } }
    }
}
