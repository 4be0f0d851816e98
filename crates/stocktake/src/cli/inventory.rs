//! Inventory snapshot import.
//!
//! The snapshot is a JSON array of asset records exported from the system of
//! record. Importing mirrors it into the local database; nothing is ever
//! written back.

use anyhow::Result;
use std::path::Path;
use stocktake_audit::AssetRecord;
use stocktake_db::StocktakeDb;
use tracing::info;

use crate::cli::error::HelpfulError;

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Vec<AssetRecord>> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        HelpfulError::new(format!("Cannot read {}: {}", path.display(), e))
            .with_suggestion("TRY: Check file permissions")
    })?;
    let records: Vec<AssetRecord> = serde_json::from_str(&content)
        .map_err(|e| HelpfulError::json_parse_error(path, &e.to_string()))?;
    Ok(records)
}

/// Upsert a snapshot file into the local mirror. Returns rows written.
pub async fn sync_snapshot(db: &StocktakeDb, path: &Path) -> Result<usize> {
    let records = read_snapshot(path)?;
    let written = db.assets_upsert(&records).await?;
    info!(
        path = %path.display(),
        records = records.len(),
        written,
        "Inventory snapshot synced"
    );
    Ok(written)
}
