//! Inventory snapshot mirror.
//!
//! Rows arrive from the system of record through [`StocktakeDb::assets_upsert`];
//! the only field this side ever changes is `last_audited_at`.

use chrono::{DateTime, Utc};
use sqlx::Row;
use stocktake_audit::{normalize_location, normalize_tag, AssetRecord};
use tracing::{debug, warn};

use crate::error::{DbError, Result};
use crate::StocktakeDb;

impl StocktakeDb {
    /// Insert or refresh asset rows. Existing audit stamps are kept.
    ///
    /// Returns the number of rows written; blank tags are skipped.
    pub async fn assets_upsert(&self, records: &[AssetRecord]) -> Result<usize> {
        let now = Self::now_millis();
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for record in records {
            let Some(tag) = normalize_tag(&record.tag) else {
                warn!("Skipping asset with blank tag");
                continue;
            };

            sqlx::query(
                r#"
                INSERT INTO assets (tag, location, status, category, last_audited_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(tag) DO UPDATE SET
                    location = excluded.location,
                    status = excluded.status,
                    category = excluded.category,
                    last_audited_at = COALESCE(excluded.last_audited_at, assets.last_audited_at),
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&tag)
            .bind(normalize_location(&record.location))
            .bind(record.status.as_str())
            .bind(record.category.as_str())
            .bind(record.last_audited_at.map(|at| at.timestamp_millis()))
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        debug!(written, "Inventory snapshot upserted");
        Ok(written)
    }

    /// Every asset in the mirror, ordered by tag.
    pub async fn assets_list(&self) -> Result<Vec<AssetRecord>> {
        let rows = sqlx::query(
            "SELECT tag, location, status, category, last_audited_at FROM assets ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_asset).collect()
    }

    /// Get an asset by (normalized) tag.
    pub async fn assets_get(&self, tag: &str) -> Result<Option<AssetRecord>> {
        let Some(tag) = normalize_tag(tag) else {
            return Ok(None);
        };
        let row = sqlx::query(
            "SELECT tag, location, status, category, last_audited_at FROM assets WHERE tag = ?",
        )
        .bind(&tag)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_asset).transpose()
    }

    /// Stamp the "last audited" marker on one asset.
    pub async fn assets_mark_audited(&self, tag: &str, at: DateTime<Utc>) -> Result<()> {
        let tag = normalize_tag(tag).ok_or_else(|| DbError::not_found("blank asset tag"))?;
        let result = sqlx::query("UPDATE assets SET last_audited_at = ? WHERE tag = ?")
            .bind(at.timestamp_millis())
            .bind(&tag)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("asset {}", tag)));
        }
        Ok(())
    }
}

fn row_to_asset(row: &sqlx::sqlite::SqliteRow) -> Result<AssetRecord> {
    let status: String = row.get("status");
    let category: String = row.get("category");
    let last_audited_at: Option<i64> = row.get("last_audited_at");

    Ok(AssetRecord {
        tag: row.get("tag"),
        location: row.get("location"),
        status: status.parse().map_err(DbError::decode)?,
        category: category.parse().map_err(DbError::decode)?,
        last_audited_at: last_audited_at.map(StocktakeDb::millis_to_datetime),
    })
}
