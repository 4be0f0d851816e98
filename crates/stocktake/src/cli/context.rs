//! Resolved settings shared by every command.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stocktake_db::StocktakeDb;

use crate::cli::config::StocktakeConfig;
use crate::cli::inventory;

pub struct CliContext {
    pub config: StocktakeConfig,
    pub database_path: PathBuf,
}

impl CliContext {
    /// Load the config file and apply command-line overrides.
    pub fn load(config_path: Option<&Path>, db_override: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => StocktakeConfig::load_or_default(path)?,
            None => StocktakeConfig::load_or_default(&StocktakeConfig::default_path())?,
        };
        let database_path = db_override.unwrap_or_else(|| config.database_path.clone());
        Ok(Self {
            config,
            database_path,
        })
    }

    pub async fn open_db(&self) -> Result<StocktakeDb> {
        StocktakeDb::open(&self.database_path)
            .await
            .with_context(|| format!("Failed to open database: {}", self.database_path.display()))
    }

    /// Open the database and, when a snapshot file is given, sync it first.
    pub async fn open_db_synced(&self, snapshot: Option<&Path>) -> Result<StocktakeDb> {
        let db = self.open_db().await?;
        if let Some(path) = snapshot {
            inventory::sync_snapshot(&db, path).await?;
        }
        Ok(db)
    }
}
