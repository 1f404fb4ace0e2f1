//! Engine configuration
//!
//! Every field has a default so partial JSON documents work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Vector2;
use crate::consts::*;
use crate::error::{ConfigError, ConfigResult};

/// Parameters fixed at engine construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gravity acceleration (units/s²)
    pub gravity: Vector2,
    /// Fixed simulation timestep in seconds
    pub fixed_delta_time: f32,
    /// Maximum steps a single `update` call may run
    pub max_substeps: u32,
    /// Broad-phase grid cell size
    pub cell_size: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, GRAVITY_Y),
            fixed_delta_time: FIXED_DT,
            max_substeps: MAX_SUBSTEPS,
            cell_size: CELL_SIZE,
        }
    }
}

impl EngineConfig {
    /// Config with the given gravity and timestep, defaults elsewhere
    pub fn new(gravity: Vector2, fixed_delta_time: f32) -> Self {
        Self {
            gravity,
            fixed_delta_time,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the fixed-step loop cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.fixed_delta_time > 0.0) || !self.fixed_delta_time.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "fixed_delta_time must be positive, got {}",
                self.fixed_delta_time
            )));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".into()));
        }
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite".into()));
        }
        Ok(())
    }
}
