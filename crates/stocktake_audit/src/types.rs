//! Asset records as supplied by the inventory snapshot feed.
//!
//! The engine never edits these; it only reads tag, location, status and
//! category. `last_audited_at` is written back through the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an asset in the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    InUse,
    Available,
    Transferring,
    Maintenance,
    Delivered,
    Defective,
    Decommissioned,
    Disposed,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 8] = [
        AssetStatus::InUse,
        AssetStatus::Available,
        AssetStatus::Transferring,
        AssetStatus::Maintenance,
        AssetStatus::Delivered,
        AssetStatus::Defective,
        AssetStatus::Decommissioned,
        AssetStatus::Disposed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::InUse => "in_use",
            AssetStatus::Available => "available",
            AssetStatus::Transferring => "transferring",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Delivered => "delivered",
            AssetStatus::Defective => "defective",
            AssetStatus::Decommissioned => "decommissioned",
            AssetStatus::Disposed => "disposed",
        }
    }

    /// Decommissioned and disposed assets are never expected anywhere.
    pub fn is_retired(&self) -> bool {
        matches!(self, AssetStatus::Decommissioned | AssetStatus::Disposed)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown asset status: {}", s))
    }
}

/// Asset category. Promotional (loaner/giveaway) stock is never audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Corporate,
    Promotional,
    Infrastructure,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Corporate => "corporate",
            AssetCategory::Promotional => "promotional",
            AssetCategory::Infrastructure => "infrastructure",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "corporate" => Ok(AssetCategory::Corporate),
            "promotional" => Ok(AssetCategory::Promotional),
            "infrastructure" => Ok(AssetCategory::Infrastructure),
            other => Err(format!("Unknown asset category: {}", other)),
        }
    }
}

/// One asset as seen by the audit engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Human-scanned identifier printed on the label
    pub tag: String,
    /// Location the system of record places the asset in
    pub location: String,
    pub status: AssetStatus,
    pub category: AssetCategory,
    /// Last time a physical audit confirmed the asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_audited_at: Option<DateTime<Utc>>,
}

impl AssetRecord {
    pub fn new(
        tag: impl Into<String>,
        location: impl Into<String>,
        status: AssetStatus,
        category: AssetCategory,
    ) -> Self {
        Self {
            tag: tag.into(),
            location: location.into(),
            status,
            category,
            last_audited_at: None,
        }
    }

    /// Whether the asset belongs in an expected set at all.
    pub fn is_auditable(&self) -> bool {
        !self.status.is_retired() && self.category != AssetCategory::Promotional
    }

    pub fn is_promotional(&self) -> bool {
        self.category == AssetCategory::Promotional
    }
}

/// Canonical form of a scanned or catalogued tag: trimmed and uppercased.
///
/// Returns `None` for blank input.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Canonical form of a location name. Only surrounding whitespace is dropped.
pub fn normalize_location(raw: &str) -> String {
    raw.trim().to_string()
}
