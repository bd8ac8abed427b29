//! Floor-dependent height loss.

use super::config::HeightLossProfile;
use super::geometry::GeometryOracle;
use super::types::Endpoint;

/// Height loss of a single endpoint: the profile's offset for its floor.
///
/// Outdoor endpoints return 0. Negative values are gains.
pub fn height_loss<G: GeometryOracle + ?Sized>(geometry: &G, profile: &HeightLossProfile, endpoint: &Endpoint) -> f64 {
    if !geometry.is_indoor(endpoint) {
        return 0.0;
    }
    profile.offset_db(geometry.floor_index(endpoint))
}
