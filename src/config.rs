use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables shared by the editor, the sync layer and the CLI.
///
/// Every field has a default, so a partial TOML file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub undo_limit: usize,
    pub px_per_second: f64,
    pub advance_threshold_seconds: f64,
    pub playhead_write_threshold_seconds: f64,
    pub scrub_threshold_seconds: f64,
    pub split_min_seconds: f64,
    pub autosave_debounce_ms: u64,
    pub nudge_step_seconds: f64,
    pub nudge_initial_delay_ms: u64,
    pub nudge_repeat_interval_ms: u64,
    pub asset_cache_capacity: usize,
    pub proxy_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_limit: 50,
            px_per_second: 48.0,
            advance_threshold_seconds: 0.12,
            playhead_write_threshold_seconds: 0.1,
            scrub_threshold_seconds: 0.05,
            split_min_seconds: 0.2,
            autosave_debounce_ms: 400,
            nudge_step_seconds: 0.1,
            nudge_initial_delay_ms: 350,
            nudge_repeat_interval_ms: 60,
            asset_cache_capacity: 256,
            proxy_base_url: "/api/uploads".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads a config file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn nudge_initial_delay(&self) -> Duration {
        Duration::from_millis(self.nudge_initial_delay_ms)
    }

    pub fn nudge_repeat_interval(&self) -> Duration {
        Duration::from_millis(self.nudge_repeat_interval_ms)
    }
}
