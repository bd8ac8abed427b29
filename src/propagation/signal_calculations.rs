//! Distance-dependent path loss and power unit helpers.
//!
//! Contains:
//! - The [`DistanceLossModel`] contract the buildings model delegates to
//! - [`PathLossModel`], the bundled distance-loss variants (fixed, free space,
//!   log-distance, Okumura-Hata)
//! - dBm / mW conversions
//!
//! Units:
//! - Power: dBm, mW
//! - Loss: dB, positive means attenuation
//! - Distance and height: meters; frequency: Hz

use serde::Deserialize;
use std::f64::consts::PI;

use super::types::Endpoint;

/// Speed of light in m/s.
const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Distances below this are evaluated at this distance.
const MIN_DISTANCE_M: f64 = 1.0;

/// Antenna heights below this are evaluated at this height (Hata takes log10 of heights).
const MIN_ANTENNA_HEIGHT_M: f64 = 1.0;

/// Distance-dependent loss between two endpoints.
///
/// Implementations must be pure and symmetric: `get_loss(a, b) == get_loss(b, a)`.
pub trait DistanceLossModel {
    /// Loss in dB.
    fn get_loss(&self, a: &Endpoint, b: &Endpoint) -> f64;
}

/// Propagation environment for the Okumura-Hata model.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Urban,
    Suburban,
    OpenArea,
}

/// Bundled distance-loss variants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathLossModel {
    /// Constant loss regardless of distance.
    Fixed { loss_db: f64 },
    /// Friis free-space loss.
    FreeSpace { frequency_hz: f64 },
    /// `PL(d) = PL(d₀) + 10 × n × log₁₀(d / d₀)`.
    LogDistance {
        path_loss_exponent: f64,
        reference_distance: f64,
        path_loss_at_reference_distance: f64,
    },
    /// Okumura-Hata macro-cell model. The higher endpoint is the base station.
    OkumuraHata {
        frequency_hz: f64,
        #[serde(default)]
        environment: Environment,
    },
}

impl PathLossModel {
    /// Reject parameters that would make the loss non-finite.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PathLossModel::Fixed { loss_db } => {
                if !loss_db.is_finite() {
                    return Err("Fixed path loss must be finite".to_string());
                }
            }
            PathLossModel::FreeSpace { frequency_hz } | PathLossModel::OkumuraHata { frequency_hz, .. } => {
                if !(frequency_hz.is_finite() && *frequency_hz > 0.0) {
                    return Err(format!("Invalid frequency_hz {}, must be positive", frequency_hz));
                }
            }
            PathLossModel::LogDistance {
                path_loss_exponent,
                reference_distance,
                path_loss_at_reference_distance,
            } => {
                if !(path_loss_exponent.is_finite() && *path_loss_exponent > 0.0) {
                    return Err("Invalid path_loss_exponent, must be positive".to_string());
                }
                if !(reference_distance.is_finite() && *reference_distance > 0.0) {
                    return Err("Invalid reference_distance, must be positive".to_string());
                }
                if !path_loss_at_reference_distance.is_finite() {
                    return Err("Invalid path_loss_at_reference_distance, must be finite".to_string());
                }
            }
        }
        Ok(())
    }

    /// Loss in dB at `distance` meters between antennas at `h_a` and `h_b` meters.
    pub fn loss_at(&self, distance: f64, h_a: f64, h_b: f64) -> f64 {
        match self {
            PathLossModel::Fixed { loss_db } => *loss_db,
            PathLossModel::FreeSpace { frequency_hz } => free_space_path_loss(distance, *frequency_hz),
            PathLossModel::LogDistance {
                path_loss_exponent,
                reference_distance,
                path_loss_at_reference_distance,
            } => log_distance_path_loss(distance, *path_loss_exponent, *reference_distance, *path_loss_at_reference_distance),
            PathLossModel::OkumuraHata { frequency_hz, environment } => {
                okumura_hata_path_loss(distance, *frequency_hz, h_a.max(h_b), h_a.min(h_b), *environment)
            }
        }
    }
}

impl DistanceLossModel for PathLossModel {
    fn get_loss(&self, a: &Endpoint, b: &Endpoint) -> f64 {
        let distance = a.position.distance(&b.position);
        self.loss_at(distance, a.position.z, b.position.z)
    }
}

/// Friis free-space path loss.
///
/// ```text
/// FSPL = 20 × log₁₀(4π × d × f / c)
/// ```
pub fn free_space_path_loss(distance: f64, frequency_hz: f64) -> f64 {
    let d = distance.max(MIN_DISTANCE_M);
    20.0 * (4.0 * PI * d * frequency_hz / SPEED_OF_LIGHT).log10()
}

/// Log-distance path loss. Distances below `d0` return `PL(d₀)`.
pub fn log_distance_path_loss(distance: f64, exponent: f64, d0: f64, pl_d0: f64) -> f64 {
    if distance <= d0 {
        return pl_d0;
    }
    pl_d0 + 10.0 * exponent * (distance / d0).log10()
}

/// Okumura-Hata path loss with the small/medium-city mobile antenna correction.
///
/// `h_bs` and `h_ms` are the base-station and mobile antenna heights.
pub fn okumura_hata_path_loss(distance: f64, frequency_hz: f64, h_bs: f64, h_ms: f64, environment: Environment) -> f64 {
    let f_mhz = frequency_hz / 1e6;
    let d_km = distance.max(MIN_DISTANCE_M) / 1000.0;
    let h_bs = h_bs.max(MIN_ANTENNA_HEIGHT_M);
    let h_ms = h_ms.max(MIN_ANTENNA_HEIGHT_M);
    let log_f = f_mhz.log10();

    let a_hms = (1.1 * log_f - 0.7) * h_ms - (1.56 * log_f - 0.8);
    let urban = 69.55 + 26.16 * log_f - 13.82 * h_bs.log10() - a_hms + (44.9 - 6.55 * h_bs.log10()) * d_km.log10();

    match environment {
        Environment::Urban => urban,
        Environment::Suburban => urban - 2.0 * (f_mhz / 28.0).log10().powi(2) - 5.4,
        Environment::OpenArea => urban - 4.78 * log_f.powi(2) + 18.33 * log_f - 40.94,
    }
}

/// Convert power from dBm to milliwatts: `P(mW) = 10^(P(dBm) / 10)`.
pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

/// Convert power from milliwatts to dBm: `P(dBm) = 10 × log₁₀(P(mW))`.
///
/// Non-positive inputs yield `-inf` or NaN.
pub fn mw_to_dbm(mw: f64) -> f64 {
    10.0 * mw.log10()
}
