//! Run configuration
//!
//! Loaded from a JSON file; every section is optional and falls back to the
//! default court and launch.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::runner::RunLimits;
use crate::sim::{Geometry, SimulationParams};
use crate::view::ViewConfig;

/// Everything a host needs to set up and finish a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub params: SimulationParams,
    pub geometry: Geometry,
    pub limits: RunLimits,
    pub view: ViewConfig,
}

impl Settings {
    /// Parse and validate settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.params.validate()?;
        self.geometry.validate()?;
        self.limits.validate()?;
        self.view.validate()?;
        Ok(())
    }
}
