//! External and internal wall penetration loss.

use super::geometry::GeometryOracle;
use super::types::Endpoint;

/// Loss of the outer wall between `endpoint` and open air.
///
/// Outdoor endpoints (and endpoints the geometry does not know) pay nothing;
/// indoor endpoints pay their building's external wall loss.
pub fn external_wall_loss<G: GeometryOracle + ?Sized>(geometry: &G, endpoint: &Endpoint) -> f64 {
    geometry.containing_building(endpoint).map(|b| b.external_wall_loss_db()).unwrap_or(0.0)
}

/// Loss of the internal walls separating two endpoints in the same building.
///
/// `crossings × per_wall_loss`, where the crossing count comes from the
/// oracle. The building's own per-wall loss overrides `default_per_wall_loss`
/// when set. Endpoints in different buildings, or outdoors, pay nothing.
pub fn internal_walls_loss<G: GeometryOracle + ?Sized>(geometry: &G, a: &Endpoint, b: &Endpoint, default_per_wall_loss: f64) -> f64 {
    if !geometry.same_building(a, b) {
        return 0.0;
    }
    let Some(building) = geometry.containing_building(a) else {
        return 0.0;
    };
    let crossings = geometry.internal_wall_crossings(a, b);
    if crossings == 0 {
        return 0.0;
    }
    let per_wall = building.internal_wall_loss_db.unwrap_or(default_per_wall_loss);
    crossings as f64 * per_wall
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::building::{Building, BuildingBounds, ExternalWallType};
    use crate::propagation::geometry::BuildingMap;
    use crate::propagation::types::Position;

    fn bounds(x_min: f64, x_max: f64) -> BuildingBounds {
        BuildingBounds {
            x_min,
            x_max,
            y_min: 0.0,
            y_max: 10.0,
            z_min: 0.0,
            z_max: 3.0,
        }
    }

    fn map() -> BuildingMap {
        BuildingMap::new(vec![
            Building::new(1, bounds(0.0, 40.0), ExternalWallType::StoneBlocks).with_rooms(4, 1),
            Building::new(2, bounds(100.0, 120.0), ExternalWallType::Wood)
                .with_rooms(2, 1)
                .with_internal_wall_loss(3.0),
        ])
        .unwrap()
    }

    fn ep(id: u32, x: f64) -> Endpoint {
        Endpoint::new(id, Position::new(x, 5.0, 1.5))
    }

    #[test]
    fn external_wall_loss_per_building() {
        let m = map();
        assert_eq!(external_wall_loss(&m, &ep(1, 5.0)), 12.0);
        assert_eq!(external_wall_loss(&m, &ep(2, 105.0)), 4.0);
        assert_eq!(external_wall_loss(&m, &ep(3, 60.0)), 0.0);
    }

    #[test]
    fn internal_walls_scale_with_crossings() {
        let m = map();
        // Rooms 0 and 3 of building 1.
        assert_eq!(internal_walls_loss(&m, &ep(1, 5.0), &ep(2, 35.0), 5.0), 15.0);
        assert_eq!(internal_walls_loss(&m, &ep(2, 35.0), &ep(1, 5.0), 5.0), 15.0);
    }

    #[test]
    fn zero_crossings_is_zero_loss() {
        let m = map();
        assert_eq!(internal_walls_loss(&m, &ep(1, 2.0), &ep(2, 8.0), 5.0), 0.0);
    }

    #[test]
    fn building_override_of_per_wall_loss() {
        let m = map();
        assert_eq!(internal_walls_loss(&m, &ep(1, 105.0), &ep(2, 115.0), 5.0), 3.0);
    }

    #[test]
    fn no_internal_loss_across_buildings_or_outdoors() {
        let m = map();
        assert_eq!(internal_walls_loss(&m, &ep(1, 5.0), &ep(2, 115.0), 5.0), 0.0);
        assert_eq!(internal_walls_loss(&m, &ep(1, 5.0), &ep(2, 60.0), 5.0), 0.0);
        assert_eq!(internal_walls_loss(&m, &ep(1, 60.0), &ep(2, 70.0), 5.0), 0.0);
    }
}
