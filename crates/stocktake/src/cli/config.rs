//! Configuration for the stocktake CLI.
//!
//! Read from `<home>/config.toml`, where home is `$STOCKTAKE_HOME` or
//! `~/.stocktake`. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stocktake_audit::AuditOptions;
use stocktake_logging::stocktake_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeConfig {
    /// Path to the SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Camera frames repeating a code inside this window are dropped
    #[serde(default = "default_camera_debounce_ms")]
    pub camera_debounce_ms: u64,

    /// Ask before auditing a location with nothing expected
    #[serde(default = "default_require_confirm_empty")]
    pub require_confirm_empty: bool,
}

fn default_database_path() -> PathBuf {
    stocktake_home().join("stocktake.sqlite3")
}

fn default_camera_debounce_ms() -> u64 {
    1500
}

fn default_require_confirm_empty() -> bool {
    true
}

impl Default for StocktakeConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            camera_debounce_ms: default_camera_debounce_ms(),
            require_confirm_empty: default_require_confirm_empty(),
        }
    }
}

impl StocktakeConfig {
    pub fn default_path() -> PathBuf {
        stocktake_home().join("config.toml")
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            frame_window: Duration::from_millis(self.camera_debounce_ms),
            require_confirm_empty: self.require_confirm_empty,
            ..AuditOptions::default()
        }
    }
}
