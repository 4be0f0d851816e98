#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::bail;
use chrono::{DateTime, Utc};
use stocktake_audit::{
    AssetCategory, AssetRecord, AssetStatus, AuditRecordStore, InventorySnapshotProvider,
    ReconciliationReport, ReportId,
};

/// In-memory inventory that records every stamp request.
#[derive(Default)]
pub struct FakeInventory {
    pub assets: Mutex<Vec<AssetRecord>>,
    pub stamps: Mutex<Vec<String>>,
    pub fail_stamps: bool,
    pub fail_listing: bool,
}

impl FakeInventory {
    pub fn with_assets(assets: Vec<AssetRecord>) -> Self {
        Self {
            assets: Mutex::new(assets),
            ..Self::default()
        }
    }

    pub fn stamps(&self) -> Vec<String> {
        self.stamps.lock().unwrap().clone()
    }
}

impl InventorySnapshotProvider for FakeInventory {
    async fn list_assets(&self) -> anyhow::Result<Vec<AssetRecord>> {
        if self.fail_listing {
            bail!("inventory feed offline");
        }
        Ok(self.assets.lock().unwrap().clone())
    }

    async fn mark_audited(&self, tag: &str, _at: DateTime<Utc>) -> anyhow::Result<()> {
        self.stamps.lock().unwrap().push(tag.to_string());
        if self.fail_stamps {
            bail!("stamp write rejected for {}", tag);
        }
        Ok(())
    }
}

/// Record store that keeps reports in memory and can be told to fail.
#[derive(Default)]
pub struct FakeStore {
    pub saved: Mutex<Vec<(ReportId, ReconciliationReport)>>,
    pub failures_left: Mutex<usize>,
}

impl FakeStore {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: Mutex::new(times),
            ..Self::default()
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

impl AuditRecordStore for FakeStore {
    async fn save_report(&self, report: &ReconciliationReport) -> anyhow::Result<ReportId> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                bail!("record store unavailable");
            }
        }
        let id = ReportId::new();
        self.saved.lock().unwrap().push((id.clone(), report.clone()));
        Ok(id)
    }
}

pub fn asset(tag: &str, location: &str) -> AssetRecord {
    AssetRecord::new(tag, location, AssetStatus::InUse, AssetCategory::Corporate)
}

/// Location L expects A, B and C; D sits in M; P is promotional stock in M.
pub fn scenario_inventory() -> Vec<AssetRecord> {
    vec![
        asset("A", "L"),
        asset("B", "L"),
        asset("C", "L"),
        asset("D", "M"),
        AssetRecord::new("P", "M", AssetStatus::InUse, AssetCategory::Promotional),
        AssetRecord::new("R", "L", AssetStatus::Disposed, AssetCategory::Corporate),
    ]
}
