//! Stocktake audit engine - physical inventory reconciliation.
//!
//! An operator picks a location, scans labels, and finishes. The engine
//! works out which expected assets were confirmed, which are missing and
//! which scanned assets belong somewhere else.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌───────────────┐
//! │  Inventory  │     │  Expected   │     │    Scan     │     │    Report     │
//! │  snapshot   │────▶│     set     │────▶│ classifier  │────▶│  (on finish)  │
//! │             │     │             │     │ ⇄ session   │     │               │
//! └─────────────┘     └─────────────┘     └─────────────┘     └───────────────┘
//! ```
//!
//! # Session lifecycle
//!
//! - **Idle**: no session for the handle
//! - **Active**: accepting scans; every scan is a self-loop
//! - **Closed**: finished (report persisted) or abandoned (nothing kept)

pub mod catalogue;
pub mod classifier;
pub mod debounce;
pub mod error;
pub mod expected;
pub mod report;
pub mod service;
pub mod session;
pub mod types;

pub use catalogue::Catalogue;
pub use classifier::{
    classify, AuditEffect, IgnoreReason, ScanClassification, ScanEvent, ScanOutcome,
};
pub use debounce::{FrameDebouncer, DEFAULT_FRAME_WINDOW};
pub use error::{AuditError, ClosedState, Result};
pub use expected::{location_summaries, ExpectedSet, LocationSummary};
pub use report::{ReconciliationReport, ReportStatus};
pub use service::{
    perform_effects, AuditOptions, AuditRecordStore, AuditService, EffectSummary, FinishedAudit,
    InventorySnapshotProvider, DEFAULT_CLOSED_HISTORY,
};
pub use session::{progress_percent, AuditSession, IntruderTag, Projection};
pub use stocktake_ids::{ReportId, SessionId};
pub use types::{normalize_location, normalize_tag, AssetCategory, AssetRecord, AssetStatus};
