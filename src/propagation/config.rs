//! Model configuration: loss constants, shadowing sigmas and policies.
//!
//! Configuration is fixed at model construction. [`ModelConfig::validate`]
//! runs inside the model constructor so an invalid value fails before any
//! query is issued.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the model configuration expected next to a scene file.
pub const CONFIG_FILE_NAME: &str = "propagation.toml";

/// Error type for invalid or unreadable model configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    FileReadError(String),
    ParseError(String),
    /// A parameter is out of range; carries the parameter name and the reason.
    InvalidParameter(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileReadError(msg) => write!(f, "Failed to read config file: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config file: {}", msg),
            ConfigError::InvalidParameter(name, msg) => write!(f, "Invalid {}: {}", name, msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which endpoints' external walls count towards the loss of a link.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExternalWallPolicy {
    /// Add the external wall loss of both endpoints. Two indoor endpoints in
    /// the same building therefore pay their building's wall loss twice.
    #[default]
    SumBoth,
    /// Add only the receiving endpoint's external wall loss.
    ///
    /// Makes `total_loss(a, b)` differ from `total_loss(b, a)` whenever only
    /// one endpoint is indoors; link loss is symmetric under `SumBoth` only.
    ReceiverOnly,
}

/// Mapping from floor index to a height loss offset in dB.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeightLossProfile {
    /// `-gain_db × floor`: every floor above ground lowers the loss by `gain_db`.
    PerFloor { gain_db: f64 },
    /// `offsets_db[floor]`, clamped to the first/last entry outside the table.
    Table { offsets_db: Vec<f64> },
}

impl Default for HeightLossProfile {
    fn default() -> Self {
        HeightLossProfile::PerFloor { gain_db: DEFAULT_HEIGHT_GAIN_PER_FLOOR }
    }
}

impl HeightLossProfile {
    /// Offset in dB for `floor`.
    pub fn offset_db(&self, floor: i32) -> f64 {
        match self {
            HeightLossProfile::PerFloor { gain_db } => -gain_db * floor as f64,
            HeightLossProfile::Table { offsets_db } => {
                let last = offsets_db.len().saturating_sub(1);
                let idx = (floor.max(0) as usize).min(last);
                offsets_db.get(idx).copied().unwrap_or(0.0)
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            HeightLossProfile::PerFloor { gain_db } => {
                if !gain_db.is_finite() {
                    return Err(ConfigError::InvalidParameter("height_loss.gain_db", "must be finite".to_string()));
                }
            }
            HeightLossProfile::Table { offsets_db } => {
                if offsets_db.is_empty() {
                    return Err(ConfigError::InvalidParameter("height_loss.offsets_db", "must not be empty".to_string()));
                }
                if offsets_db.iter().any(|v| !v.is_finite()) {
                    return Err(ConfigError::InvalidParameter("height_loss.offsets_db", "entries must be finite".to_string()));
                }
                let non_increasing = offsets_db.windows(2).all(|w| w[1] <= w[0]);
                let non_decreasing = offsets_db.windows(2).all(|w| w[1] >= w[0]);
                if !(non_increasing || non_decreasing) {
                    return Err(ConfigError::InvalidParameter("height_loss.offsets_db", "must be monotone in floor index".to_string()));
                }
            }
        }
        Ok(())
    }
}

pub const DEFAULT_INTERNAL_WALL_LOSS: f64 = 5.0;
pub const DEFAULT_SIGMA_INDOOR: f64 = 8.0;
pub const DEFAULT_SIGMA_OUTDOOR: f64 = 7.0;
pub const DEFAULT_SIGMA_EXTERNAL_WALLS: f64 = 5.0;
pub const DEFAULT_HEIGHT_GAIN_PER_FLOOR: f64 = 2.0;

/// Parameters of the buildings propagation loss model.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Loss per internal wall crossed (dB).
    pub internal_wall_loss: f64,
    /// Shadowing standard deviation when both endpoints are indoors (dB).
    pub shadowing_sigma_indoor: f64,
    /// Shadowing standard deviation when both endpoints are outdoors (dB).
    pub shadowing_sigma_outdoor: f64,
    /// Shadowing standard deviation when exactly one endpoint is indoors (dB).
    pub shadowing_sigma_external_walls: f64,
    /// Mean of the shadowing distribution (dB).
    pub shadowing_mean: f64,
    pub external_wall_policy: ExternalWallPolicy,
    pub height_loss: HeightLossProfile,
    /// Seed for the shadowing generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            internal_wall_loss: DEFAULT_INTERNAL_WALL_LOSS,
            shadowing_sigma_indoor: DEFAULT_SIGMA_INDOOR,
            shadowing_sigma_outdoor: DEFAULT_SIGMA_OUTDOOR,
            shadowing_sigma_external_walls: DEFAULT_SIGMA_EXTERNAL_WALLS,
            shadowing_mean: 0.0,
            external_wall_policy: ExternalWallPolicy::default(),
            height_loss: HeightLossProfile::default(),
            seed: None,
        }
    }
}

impl ModelConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ModelConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Derive the config path from a scene file path.
    ///
    /// Replaces the scene filename with [`CONFIG_FILE_NAME`] in the same directory.
    pub fn config_path_from_scene(scene_path: &str) -> PathBuf {
        let scene = Path::new(scene_path);
        scene.parent().unwrap_or(Path::new(".")).join(CONFIG_FILE_NAME)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("internal_wall_loss", self.internal_wall_loss)?;
        check_non_negative("shadowing_sigma_indoor", self.shadowing_sigma_indoor)?;
        check_non_negative("shadowing_sigma_outdoor", self.shadowing_sigma_outdoor)?;
        check_non_negative("shadowing_sigma_external_walls", self.shadowing_sigma_external_walls)?;
        if !self.shadowing_mean.is_finite() {
            return Err(ConfigError::InvalidParameter("shadowing_mean", "must be finite".to_string()));
        }
        self.height_loss.validate()
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidParameter(name, format!("{} must be a finite, non-negative value", value)));
    }
    Ok(())
}
