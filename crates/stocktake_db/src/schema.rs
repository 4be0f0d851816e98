//! Table definitions. All CREATE statements live here.

use crate::error::Result;
use crate::StocktakeDb;
use tracing::debug;

impl StocktakeDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;

        self.create_asset_tables().await?;
        self.create_report_tables().await?;

        debug!("Database schema verified");
        Ok(())
    }

    /// Local mirror of the inventory snapshot
    async fn create_asset_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS assets (
                tag TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                status TEXT NOT NULL,
                category TEXT NOT NULL,
                last_audited_at INTEGER,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_assets_location ON assets(location)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Finished reconciliation reports. Rows are written once, never updated.
    async fn create_report_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS audit_reports (
                id TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                finished_at INTEGER NOT NULL,
                expected_count INTEGER NOT NULL,
                found_count INTEGER NOT NULL,
                scan_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                missing_json TEXT NOT NULL,
                intruders_json TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reports_location ON audit_reports(location, finished_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
