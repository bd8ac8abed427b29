//! Scene loading, parsing, and validation logic.
//!
//! A scene is a JSON file listing the buildings, the nodes (with their
//! positions and transmit power) and the distance-dependent path loss model
//! to use between them.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

use crate::propagation::building::Building;
use crate::propagation::signal_calculations::PathLossModel;
use crate::propagation::types::{Endpoint, NodeId, Position};

/// Error type for scene loading failures.
#[derive(Debug)]
pub enum SceneLoadError {
    FileReadError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::FileReadError(msg) => write!(f, "Failed to read file: {}", msg),
            SceneLoadError::ParseError(msg) => write!(f, "Failed to parse JSON: {}", msg),
            SceneLoadError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Node structure with position and transmit power.
#[derive(Debug, Deserialize, Clone)]
pub struct Node {
    pub node_id: NodeId,
    pub position: Position,
    /// Transmit power in dBm.
    #[serde(default = "default_tx_power")]
    pub tx_power_dbm: f64,
}

fn default_tx_power() -> f64 {
    14.0
}

impl Node {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.node_id, self.position)
    }
}

/// Root structure representing the entire scene.
#[derive(Debug, Deserialize)]
pub struct Scene {
    /// Distance-dependent loss between nodes.
    pub path_loss_model: PathLossModel,
    /// Buildings the nodes may be in.
    #[serde(default)]
    pub buildings: Vec<Building>,
    /// All nodes present in the scene.
    pub nodes: Vec<Node>,
}

/// Load and parse a scene from a file.
///
/// # Parameters
///
/// * `path` - Path to the scene JSON file
///
/// # Returns
///
/// Parsed and validated Scene or an error.
pub fn load_scene(path: &str) -> Result<Scene, SceneLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))
        .map_err(|e| SceneLoadError::FileReadError(e.to_string()))?;
    parse_scene(&data)
}

/// Parse and validate a scene from JSON text.
pub fn parse_scene(data: &str) -> Result<Scene, SceneLoadError> {
    let scene: Scene = serde_json::from_str(data)
        .context("Invalid JSON format")
        .map_err(|e| SceneLoadError::ParseError(format!("{:#}", e)))?;

    validate_scene(&scene).map_err(SceneLoadError::ValidationError)?;

    Ok(scene)
}

/// Validate scene configuration.
///
/// # Returns
///
/// `Ok(())` if validation passes, `Err(String)` with error description otherwise.
pub fn validate_scene(scene: &Scene) -> Result<(), String> {
    const MAX_NODES: usize = 10000;
    const MIN_TX_POWER: f64 = -50.0;
    const MAX_TX_POWER: f64 = 50.0;

    if scene.nodes.is_empty() {
        return Err("Scene must contain at least one node".to_string());
    }
    if scene.nodes.len() > MAX_NODES {
        return Err(format!("Node count {} exceeds maximum of {}", scene.nodes.len(), MAX_NODES));
    }

    let mut node_ids = HashSet::new();
    for node in &scene.nodes {
        if !node_ids.insert(node.node_id) {
            return Err(format!("Duplicate node_id found: {}", node.node_id));
        }
    }

    for node in &scene.nodes {
        if !node.position.is_finite() {
            return Err(format!("Node {} has a non-finite position", node.node_id));
        }
        if !(MIN_TX_POWER..=MAX_TX_POWER).contains(&node.tx_power_dbm) {
            return Err(format!(
                "Node {} tx_power_dbm {} dBm outside realistic range ({} to {} dBm)",
                node.node_id, node.tx_power_dbm, MIN_TX_POWER, MAX_TX_POWER
            ));
        }
    }

    scene.path_loss_model.validate()?;

    let mut building_ids = HashSet::new();
    for building in &scene.buildings {
        if !building_ids.insert(building.building_id) {
            return Err(format!("Duplicate building_id found: {}", building.building_id));
        }
        building.validate().map_err(|e| e.to_string())?;
    }

    Ok(())
}
