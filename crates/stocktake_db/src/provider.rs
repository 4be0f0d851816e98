//! Audit engine collaborator implementations.

use chrono::{DateTime, Utc};
use stocktake_audit::{
    AssetRecord, AuditRecordStore, InventorySnapshotProvider, ReconciliationReport,
};
use stocktake_ids::ReportId;

use crate::StocktakeDb;

impl InventorySnapshotProvider for StocktakeDb {
    async fn list_assets(&self) -> anyhow::Result<Vec<AssetRecord>> {
        Ok(self.assets_list().await?)
    }

    async fn mark_audited(&self, tag: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        Ok(self.assets_mark_audited(tag, at).await?)
    }
}

impl AuditRecordStore for StocktakeDb {
    async fn save_report(&self, report: &ReconciliationReport) -> anyhow::Result<ReportId> {
        Ok(self.reports_save(report).await?)
    }
}
