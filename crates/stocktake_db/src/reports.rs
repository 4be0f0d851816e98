//! Reconciliation report storage. Reports are insert-only.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use stocktake_audit::{IntruderTag, ReconciliationReport};
use stocktake_ids::ReportId;
use tracing::info;

use crate::error::{DbError, Result};
use crate::StocktakeDb;

/// A report together with the id the store assigned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: ReportId,
    #[serde(flatten)]
    pub report: ReconciliationReport,
}

const REPORT_COLUMNS: &str = "id, location, started_at, finished_at, expected_count, found_count, \
     scan_count, status, missing_json, intruders_json";

impl StocktakeDb {
    /// Persist a finished report and return its new id.
    pub async fn reports_save(&self, report: &ReconciliationReport) -> Result<ReportId> {
        let id = ReportId::new();
        let missing_json = serde_json::to_string(&report.missing_tags)?;
        let intruders_json = serde_json::to_string(&report.intruder_tags)?;

        sqlx::query(
            r#"
            INSERT INTO audit_reports (id, location, started_at, finished_at, expected_count,
                found_count, scan_count, status, missing_json, intruders_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&report.location)
        .bind(report.started_at.timestamp_millis())
        .bind(report.timestamp.timestamp_millis())
        .bind(report.expected_count as i64)
        .bind(report.found_count as i64)
        .bind(report.scan_count as i64)
        .bind(report.status.as_str())
        .bind(&missing_json)
        .bind(&intruders_json)
        .execute(&self.pool)
        .await?;

        info!(report_id = %id, location = %report.location, status = %report.status, "Report saved");
        Ok(id)
    }

    /// Get a report by id.
    pub async fn reports_get(&self, id: &ReportId) -> Result<Option<StoredReport>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM audit_reports WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_report).transpose()
    }

    /// Most recent reports first, optionally for one location.
    pub async fn reports_list(&self, location: Option<&str>, limit: i64) -> Result<Vec<StoredReport>> {
        let rows = match location {
            Some(location) => {
                let sql = format!(
                    "SELECT {REPORT_COLUMNS} FROM audit_reports WHERE location = ? \
                     ORDER BY finished_at DESC LIMIT ?"
                );
                sqlx::query(&sql)
                    .bind(location.trim())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("SELECT {REPORT_COLUMNS} FROM audit_reports ORDER BY finished_at DESC LIMIT ?");
                sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(row_to_report).collect()
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<StoredReport> {
    let id: String = row.get("id");
    let id = ReportId::parse(&id).map_err(|e| DbError::decode(e.to_string()))?;
    let status: String = row.get("status");
    let missing_json: String = row.get("missing_json");
    let intruders_json: String = row.get("intruders_json");
    let missing_tags: Vec<String> = serde_json::from_str(&missing_json)?;
    let intruder_tags: Vec<IntruderTag> = serde_json::from_str(&intruders_json)?;

    Ok(StoredReport {
        id,
        report: ReconciliationReport {
            location: row.get("location"),
            timestamp: StocktakeDb::millis_to_datetime(row.get("finished_at")),
            started_at: StocktakeDb::millis_to_datetime(row.get("started_at")),
            expected_count: row.get::<i64, _>("expected_count") as usize,
            found_count: row.get::<i64, _>("found_count") as usize,
            missing_tags,
            intruder_tags,
            scan_count: row.get::<i64, _>("scan_count") as usize,
            status: status.parse().map_err(DbError::decode)?,
        },
    })
}
