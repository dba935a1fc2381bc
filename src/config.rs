//! Render configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest dump side in pixels. Bigger worlds are rendered through a random window.
pub const MAX_DUMP_SIDE: usize = 16384;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DumpMode {
    /// Shaded pseudo-3d relief
    #[default]
    Relief,
    /// Flat terrain colours
    Flat,
    /// Flat terrain with contour lines
    Topographic,
    /// Cave layer
    Cave,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub mode: DumpMode,
    /// Tint tiles below sea level blue (flat and topographic modes).
    pub show_water: bool,
    /// Height step between contour lines; 0 disables them.
    pub contour_interval: u16,
    /// Fixed seed for the sampling window of oversized worlds.
    pub seed: Option<u64>,
    pub max_side: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            mode: DumpMode::default(),
            show_water: true,
            contour_interval: 10,
            seed: None,
            max_side: MAX_DUMP_SIDE,
        }
    }
}

impl DumpConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
