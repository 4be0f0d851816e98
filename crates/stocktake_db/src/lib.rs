//! SQLite persistence for Stocktake.
//!
//! Holds the local mirror of the inventory snapshot (with "last audited"
//! stamps) and the finished reconciliation reports. [`StocktakeDb`]
//! implements both collaborator traits of the audit engine.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stocktake_db::StocktakeDb;
//!
//! let db = StocktakeDb::open("~/.stocktake/stocktake.sqlite3").await?;
//! let assets = db.assets_list().await?;
//! let recent = db.reports_list(Some("Lab 2"), 10).await?;
//! ```

mod assets;
mod error;
mod provider;
mod reports;
mod schema;

pub use error::{DbError, Result};
pub use reports::StoredReport;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the Stocktake database. Cheap to clone.
#[derive(Clone)]
pub struct StocktakeDb {
    pool: SqlitePool,
}

impl StocktakeDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl StocktakeDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}
