//! Geometry oracle: building facts about endpoints.
//!
//! The loss model never inspects floorplans directly. It asks a
//! [`GeometryOracle`] whether an endpoint is indoors, which building holds it,
//! which floor it is on and how many internal walls separate two endpoints.
//!
//! [`BuildingMap`] is the bundled oracle over a list of box-shaped
//! [`Building`]s. Positions outside every building are outdoors; this is also
//! the answer for any endpoint the geometry knows nothing about, so
//! outdoor-only scenarios need no building data at all.

use super::building::{Building, IndoorLocation};
use super::config::ConfigError;
use super::types::Endpoint;

/// Read-only building facts about endpoints.
pub trait GeometryOracle {
    /// Building containing `endpoint`, or `None` when it is outdoors.
    fn containing_building(&self, endpoint: &Endpoint) -> Option<&Building>;

    /// Zero-based floor of `endpoint`. Outdoor endpoints are on floor 0.
    fn floor_index(&self, endpoint: &Endpoint) -> i32;

    /// Internal walls crossed on the way from `a` to `b`.
    ///
    /// Only meaningful when both endpoints are in the same building; returns 0 otherwise.
    fn internal_wall_crossings(&self, a: &Endpoint, b: &Endpoint) -> u32;

    fn is_indoor(&self, endpoint: &Endpoint) -> bool {
        self.containing_building(endpoint).is_some()
    }

    /// True when both endpoints are indoors in the same building.
    fn same_building(&self, a: &Endpoint, b: &Endpoint) -> bool {
        match (self.containing_building(a), self.containing_building(b)) {
            (Some(ba), Some(bb)) => ba.building_id == bb.building_id,
            _ => false,
        }
    }
}

/// Geometry oracle over a static set of buildings.
#[derive(Debug, Clone, Default)]
pub struct BuildingMap {
    buildings: Vec<Building>,
}

impl BuildingMap {
    /// Build the map after validating every building.
    pub fn new(buildings: Vec<Building>) -> Result<Self, ConfigError> {
        for building in &buildings {
            building.validate()?;
        }
        Ok(Self { buildings })
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// First building whose box contains the endpoint, with the indoor location.
    ///
    /// Overlapping buildings resolve to the one listed first.
    pub fn locate(&self, endpoint: &Endpoint) -> Option<(&Building, IndoorLocation)> {
        self.buildings.iter().find_map(|b| b.locate(&endpoint.position).map(|loc| (b, loc)))
    }
}

impl GeometryOracle for BuildingMap {
    fn containing_building(&self, endpoint: &Endpoint) -> Option<&Building> {
        self.locate(endpoint).map(|(b, _)| b)
    }

    fn floor_index(&self, endpoint: &Endpoint) -> i32 {
        self.locate(endpoint).map(|(_, loc)| loc.floor).unwrap_or(0)
    }

    /// Walls counted as the Manhattan distance between the two room cells.
    ///
    /// This approximates a ray–wall intersection: a straight line between two
    /// rooms of a regular grid crosses at least this many partitions. Floors are
    /// not walls and do not add crossings.
    fn internal_wall_crossings(&self, a: &Endpoint, b: &Endpoint) -> u32 {
        match (self.locate(a), self.locate(b)) {
            (Some((_, la)), Some((_, lb))) if la.building_id == lb.building_id => la.room_x.abs_diff(lb.room_x) + la.room_y.abs_diff(lb.room_y),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::building::{BuildingBounds, ExternalWallType};
    use crate::propagation::types::Position;

    fn map() -> BuildingMap {
        let office = Building::new(
            1,
            BuildingBounds {
                x_min: 0.0,
                x_max: 30.0,
                y_min: 0.0,
                y_max: 30.0,
                z_min: 0.0,
                z_max: 6.0,
            },
            ExternalWallType::ConcreteWithWindows,
        )
        .with_floors(2)
        .with_rooms(3, 3);
        let shed = Building::new(
            2,
            BuildingBounds {
                x_min: 100.0,
                x_max: 110.0,
                y_min: 0.0,
                y_max: 10.0,
                z_min: 0.0,
                z_max: 3.0,
            },
            ExternalWallType::Wood,
        );
        BuildingMap::new(vec![office, shed]).unwrap()
    }

    fn ep(id: u32, x: f64, y: f64, z: f64) -> Endpoint {
        Endpoint::new(id, Position::new(x, y, z))
    }

    #[test]
    fn indoor_and_outdoor_classification() {
        let m = map();
        assert!(m.is_indoor(&ep(1, 5.0, 5.0, 1.0)));
        assert!(m.is_indoor(&ep(2, 105.0, 5.0, 1.0)));
        assert!(!m.is_indoor(&ep(3, 50.0, 50.0, 1.5)));
        assert_eq!(m.containing_building(&ep(2, 105.0, 5.0, 1.0)).map(|b| b.building_id), Some(2));
    }

    #[test]
    fn floor_index_defaults_to_ground_outdoors() {
        let m = map();
        assert_eq!(m.floor_index(&ep(1, 5.0, 5.0, 4.5)), 1);
        assert_eq!(m.floor_index(&ep(1, 50.0, 50.0, 40.0)), 0);
    }

    #[test]
    fn wall_crossings_follow_room_grid() {
        let m = map();
        let a = ep(1, 5.0, 5.0, 1.0);
        let b = ep(2, 25.0, 15.0, 1.0);
        assert_eq!(m.internal_wall_crossings(&a, &b), 3);
        assert_eq!(m.internal_wall_crossings(&b, &a), 3);
        // Same room, different floor.
        assert_eq!(m.internal_wall_crossings(&a, &ep(3, 6.0, 6.0, 4.0)), 0);
    }

    #[test]
    fn no_crossings_across_buildings_or_outdoors() {
        let m = map();
        let a = ep(1, 5.0, 5.0, 1.0);
        assert_eq!(m.internal_wall_crossings(&a, &ep(2, 105.0, 5.0, 1.0)), 0);
        assert_eq!(m.internal_wall_crossings(&a, &ep(3, 60.0, 5.0, 1.0)), 0);
        assert!(!m.same_building(&a, &ep(2, 105.0, 5.0, 1.0)));
        assert!(m.same_building(&a, &ep(2, 25.0, 25.0, 5.0)));
    }

    #[test]
    fn invalid_building_rejected() {
        let bounds = BuildingBounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
            z_min: 0.0,
            z_max: 3.0,
        };
        let walls = Building::new(1, bounds, ExternalWallType::Wood).with_internal_wall_loss(-5.0).with_rooms(3, 1);
        assert!(matches!(BuildingMap::new(vec![walls]), Err(ConfigError::InvalidParameter("internal_wall_loss_db", _))));
        assert!(BuildingMap::new(vec![]).unwrap().buildings().is_empty());
    }

    #[test]
    fn empty_map_is_all_outdoors() {
        let m = BuildingMap::default();
        let a = ep(1, 5.0, 5.0, 1.0);
        assert!(!m.is_indoor(&a));
        assert_eq!(m.floor_index(&a), 0);
    }
}
