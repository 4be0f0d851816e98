//! Reconciliation report built when a session finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::{AuditSession, IntruderTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Every expected asset was confirmed (an empty location counts)
    Complete,
    Partial,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Complete => "Complete",
            ReportStatus::Partial => "Partial",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Complete" => Ok(ReportStatus::Complete),
            "Partial" => Ok(ReportStatus::Partial),
            other => Err(format!("Unknown report status: {}", other)),
        }
    }
}

/// Immutable outcome of a finished audit. Field names are the contract the
/// audit record store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub location: String,
    /// When the session was finished
    pub timestamp: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub expected_count: usize,
    pub found_count: usize,
    pub missing_tags: Vec<String>,
    pub intruder_tags: Vec<IntruderTag>,
    /// Events in the session log, duplicates and unknowns included
    pub scan_count: usize,
    pub status: ReportStatus,
}

impl ReconciliationReport {
    /// Build the report from the session's projections at `at`.
    pub fn from_session(session: &AuditSession, at: DateTime<Utc>) -> Self {
        let projection = session.projection();
        let status = if projection.missing_tags.is_empty() {
            ReportStatus::Complete
        } else {
            ReportStatus::Partial
        };

        Self {
            location: session.location().to_string(),
            timestamp: at,
            started_at: session.started_at(),
            expected_count: session.expected().len(),
            found_count: projection.found_tags.len(),
            missing_tags: projection.missing_tags,
            intruder_tags: projection.intruder_tags,
            scan_count: session.events().len(),
            status,
        }
    }

    pub fn missing_count(&self) -> usize {
        self.missing_tags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Catalogue;
    use crate::types::{AssetCategory, AssetRecord, AssetStatus};

    fn session(records: Vec<AssetRecord>) -> AuditSession {
        AuditSession::start("L", Catalogue::from_records(records))
    }

    #[test]
    fn test_full_confirmation_is_complete() {
        let mut session = session(vec![
            AssetRecord::new("A", "L", AssetStatus::InUse, AssetCategory::Corporate),
            AssetRecord::new("B", "L", AssetStatus::InUse, AssetCategory::Corporate),
        ]);
        session.submit("A", Utc::now());
        session.submit("B", Utc::now());
        assert_eq!(session.progress_percent(), 100);

        let report = ReconciliationReport::from_session(&session, Utc::now());
        assert_eq!(report.status, ReportStatus::Complete);
        assert_eq!(report.found_count, 2);
        assert_eq!(report.missing_count(), 0);
    }

    #[test]
    fn test_report_json_field_names() {
        let session = session(vec![AssetRecord::new(
            "A",
            "L",
            AssetStatus::InUse,
            AssetCategory::Corporate,
        )]);
        let report = ReconciliationReport::from_session(&session, Utc::now());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["expectedCount"], 1);
        assert_eq!(value["foundCount"], 0);
        assert_eq!(value["missingTags"], serde_json::json!(["A"]));
        assert_eq!(value["intruderTags"], serde_json::json!([]));
        assert_eq!(value["status"], "Partial");
    }
}
