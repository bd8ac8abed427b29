//! Building descriptions consumed by the geometry oracle.
//!
//! A building is an axis-aligned box split into `floors` equal-height storeys
//! and a `rooms_x` × `rooms_y` grid of equally sized rooms on every floor.

use serde::Deserialize;

use super::config::ConfigError;
use super::types::Position;

/// External wall construction. Each material maps to a fixed penetration loss.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExternalWallType {
    Wood,
    #[default]
    ConcreteWithWindows,
    ConcreteWithoutWindows,
    StoneBlocks,
}

impl ExternalWallType {
    /// Penetration loss in dB for one crossing of this wall type.
    pub fn loss_db(&self) -> f64 {
        match self {
            ExternalWallType::Wood => 4.0,
            ExternalWallType::ConcreteWithWindows => 7.0,
            ExternalWallType::ConcreteWithoutWindows => 15.0,
            ExternalWallType::StoneBlocks => 12.0,
        }
    }
}

/// Axis-aligned bounds of a building in world coordinates (meters).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BuildingBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    #[serde(default)]
    pub z_min: f64,
    pub z_max: f64,
}

impl BuildingBounds {
    /// Inclusive point-in-box test.
    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max && p.z >= self.z_min && p.z <= self.z_max
    }
}

/// Where inside a building a position lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndoorLocation {
    pub building_id: u32,
    /// Zero-based floor; 0 is the ground floor.
    pub floor: i32,
    pub room_x: u32,
    pub room_y: u32,
}

/// A building with its wall properties.
#[derive(Debug, Deserialize, Clone)]
pub struct Building {
    pub building_id: u32,
    pub bounds: BuildingBounds,
    #[serde(default = "default_count")]
    pub floors: u32,
    #[serde(default = "default_count")]
    pub rooms_x: u32,
    #[serde(default = "default_count")]
    pub rooms_y: u32,
    #[serde(default)]
    pub external_wall_type: ExternalWallType,
    /// Explicit external wall loss; overrides `external_wall_type` when set.
    #[serde(default)]
    pub external_wall_loss_db: Option<f64>,
    /// Per-crossing internal wall loss; the model-wide value applies when unset.
    #[serde(default)]
    pub internal_wall_loss_db: Option<f64>,
}

fn default_count() -> u32 {
    1
}

impl Building {
    /// Single-floor, single-room building of the given wall type.
    pub fn new(building_id: u32, bounds: BuildingBounds, external_wall_type: ExternalWallType) -> Self {
        Self {
            building_id,
            bounds,
            floors: 1,
            rooms_x: 1,
            rooms_y: 1,
            external_wall_type,
            external_wall_loss_db: None,
            internal_wall_loss_db: None,
        }
    }

    pub fn with_floors(mut self, floors: u32) -> Self {
        self.floors = floors;
        self
    }

    pub fn with_rooms(mut self, rooms_x: u32, rooms_y: u32) -> Self {
        self.rooms_x = rooms_x;
        self.rooms_y = rooms_y;
        self
    }

    pub fn with_external_wall_loss(mut self, loss_db: f64) -> Self {
        self.external_wall_loss_db = Some(loss_db);
        self
    }

    pub fn with_internal_wall_loss(mut self, loss_db: f64) -> Self {
        self.internal_wall_loss_db = Some(loss_db);
        self
    }

    /// Loss for crossing this building's outer wall, in dB.
    pub fn external_wall_loss_db(&self) -> f64 {
        self.external_wall_loss_db.unwrap_or_else(|| self.external_wall_type.loss_db())
    }

    /// Reject malformed boxes, empty grids and negative wall losses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bounds;
        let finite = [b.x_min, b.x_max, b.y_min, b.y_max, b.z_min, b.z_max].iter().all(|v| v.is_finite());
        if !finite || b.x_min >= b.x_max || b.y_min >= b.y_max || b.z_min >= b.z_max {
            return Err(ConfigError::InvalidParameter(
                "bounds",
                format!("building {} has invalid bounds: each minimum must be strictly less than its maximum", self.building_id),
            ));
        }
        if self.floors == 0 || self.rooms_x == 0 || self.rooms_y == 0 {
            return Err(ConfigError::InvalidParameter(
                "floors",
                format!("building {} must have at least one floor and one room per axis", self.building_id),
            ));
        }
        for (name, loss) in [("external_wall_loss_db", self.external_wall_loss_db), ("internal_wall_loss_db", self.internal_wall_loss_db)] {
            if let Some(loss) = loss {
                if !loss.is_finite() || loss < 0.0 {
                    return Err(ConfigError::InvalidParameter(
                        name,
                        format!("building {} has {} dB, must be a finite, non-negative value", self.building_id, loss),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Locate `p` inside this building, or `None` if it lies outside.
    ///
    /// Positions on the top boundary or a far wall are assigned to the last
    /// floor / room rather than a non-existent one past the edge.
    pub fn locate(&self, p: &Position) -> Option<IndoorLocation> {
        if !self.bounds.contains(p) {
            return None;
        }
        let floor = grid_cell(p.z - self.bounds.z_min, self.bounds.z_max - self.bounds.z_min, self.floors);
        let room_x = grid_cell(p.x - self.bounds.x_min, self.bounds.x_max - self.bounds.x_min, self.rooms_x);
        let room_y = grid_cell(p.y - self.bounds.y_min, self.bounds.y_max - self.bounds.y_min, self.rooms_y);
        Some(IndoorLocation {
            building_id: self.building_id,
            floor: floor as i32,
            room_x,
            room_y,
        })
    }
}

/// Index of the cell containing `offset` when `extent` is split into `cells` equal parts.
fn grid_cell(offset: f64, extent: f64, cells: u32) -> u32 {
    if cells <= 1 || extent <= 0.0 {
        return 0;
    }
    let cell = (offset / (extent / cells as f64)).floor();
    (cell.max(0.0) as u32).min(cells - 1)
}
