//! Session registry wired to the inventory and audit record collaborators.
//!
//! Every call names its session by [`SessionId`]. Sessions never share
//! state; the service only routes calls to the right one.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use stocktake_ids::{ReportId, SessionId};
use tracing::{debug, info, warn};

use crate::catalogue::Catalogue;
use crate::classifier::{AuditEffect, IgnoreReason, ScanEvent, ScanOutcome};
use crate::debounce::{FrameDebouncer, DEFAULT_FRAME_WINDOW};
use crate::error::{AuditError, ClosedState, Result};
use crate::expected::{location_summaries, LocationSummary};
use crate::report::ReconciliationReport;
use crate::session::{AuditSession, Projection};
use crate::types::{normalize_tag, AssetRecord};

/// Read side of the inventory plus the best-effort audit stamp.
pub trait InventorySnapshotProvider: Send + Sync {
    fn list_assets(&self) -> impl Future<Output = anyhow::Result<Vec<AssetRecord>>> + Send;

    fn mark_audited(
        &self,
        tag: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Durable home for finished reports.
pub trait AuditRecordStore: Send + Sync {
    fn save_report(
        &self,
        report: &ReconciliationReport,
    ) -> impl Future<Output = anyhow::Result<ReportId>> + Send;
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Camera frames repeating a code inside this window are dropped
    pub frame_window: Duration,
    /// Starting a session on a location with nothing to audit needs
    /// explicit confirmation
    pub require_confirm_empty: bool,
    /// How many finished or abandoned handles are remembered. Older ones
    /// are forgotten and then report `UnknownSession`.
    pub closed_history: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            frame_window: DEFAULT_FRAME_WINDOW,
            require_confirm_empty: true,
            closed_history: DEFAULT_CLOSED_HISTORY,
        }
    }
}

/// A report that the record store accepted.
#[derive(Debug, Clone)]
pub struct FinishedAudit {
    pub report_id: ReportId,
    pub report: ReconciliationReport,
}

/// Tally of effects run by [`perform_effects`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectSummary {
    pub applied: usize,
    pub failed: usize,
}

/// Run scan side effects against the inventory.
///
/// Failures are logged and counted. They never change how a scan was
/// classified.
pub async fn perform_effects<P: InventorySnapshotProvider>(
    provider: &P,
    effects: &[AuditEffect],
) -> EffectSummary {
    let mut summary = EffectSummary::default();
    for effect in effects {
        match effect {
            AuditEffect::MarkAudited { tag, at } => match provider.mark_audited(tag, *at).await {
                Ok(()) => summary.applied += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(
                        tag = %tag,
                        error = %format!("{err:#}"),
                        "Failed to stamp last-audited marker; scan stays confirmed"
                    );
                }
            },
        }
    }
    summary
}

pub const DEFAULT_CLOSED_HISTORY: usize = 1024;

/// Bounded record of sessions that left `Active`, oldest evicted first.
struct ClosedSessions {
    states: HashMap<SessionId, ClosedState>,
    order: VecDeque<SessionId>,
    capacity: usize,
}

impl ClosedSessions {
    fn new(capacity: usize) -> Self {
        Self {
            states: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn insert(&mut self, id: SessionId, state: ClosedState) {
        if self.capacity == 0 {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.states.remove(&oldest);
            }
        }
        self.order.push_back(id.clone());
        self.states.insert(id, state);
    }

    fn error_for(&self, id: &SessionId) -> AuditError {
        match self.states.get(id) {
            Some(state) => AuditError::SessionClosed {
                id: id.clone(),
                state: state.clone(),
            },
            None => AuditError::UnknownSession(id.clone()),
        }
    }
}

struct ActiveSession {
    session: AuditSession,
    frames: FrameDebouncer,
}

pub struct AuditService<P, S> {
    provider: Arc<P>,
    store: S,
    options: AuditOptions,
    active: HashMap<SessionId, ActiveSession>,
    closed: ClosedSessions,
}

impl<P, S> AuditService<P, S>
where
    P: InventorySnapshotProvider,
    S: AuditRecordStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self::with_options(provider, store, AuditOptions::default())
    }

    pub fn with_options(provider: P, store: S, options: AuditOptions) -> Self {
        Self {
            provider: Arc::new(provider),
            store,
            closed: ClosedSessions::new(options.closed_history),
            options,
            active: HashMap::new(),
        }
    }

    /// Shared handle to the inventory, for callers that run effects on
    /// their own task.
    pub fn provider(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Per-location auditable counts for the selection screen.
    pub async fn location_summaries(&self) -> Result<Vec<LocationSummary>> {
        let catalogue = self.load_catalogue().await?;
        Ok(location_summaries(&catalogue))
    }

    /// Idle -> Active. Freezes the expected set for `location`.
    ///
    /// An empty expected set is refused unless `allow_empty` is set or the
    /// service was configured not to ask.
    pub async fn start_session(&mut self, location: &str, allow_empty: bool) -> Result<SessionId> {
        let catalogue = self.load_catalogue().await?;
        let session = AuditSession::start(location, catalogue);

        if session.expected().is_empty() && self.options.require_confirm_empty && !allow_empty {
            return Err(AuditError::EmptyLocation(session.location().to_string()));
        }

        let id = session.id().clone();
        info!(
            session_id = %id,
            location = %session.location(),
            expected = session.expected().len(),
            catalogue = session.catalogue().len(),
            "Audit session started"
        );
        self.active.insert(
            id.clone(),
            ActiveSession {
                session,
                frames: FrameDebouncer::new(self.options.frame_window),
            },
        );
        Ok(id)
    }

    /// Classify a manually entered code. Effects are returned, not run.
    pub fn record_scan(&mut self, id: &SessionId, raw: &str) -> Result<ScanOutcome> {
        let active = self.active_mut(id)?;
        Ok(active.session.submit(raw, Utc::now()))
    }

    /// Classify a camera frame after the debounce window. Effects are
    /// returned, not run.
    pub fn record_frame(&mut self, id: &SessionId, raw: &str, at: Instant) -> Result<ScanOutcome> {
        let active = self.active_mut(id)?;
        let Some(code) = normalize_tag(raw) else {
            return Ok(ScanOutcome::Ignored(IgnoreReason::Blank));
        };
        if !active.frames.admit(&code, at) {
            debug!(session_id = %id, code = %code, "Camera frame debounced");
            return Ok(ScanOutcome::Ignored(IgnoreReason::Debounced));
        }
        Ok(active.session.submit(&code, Utc::now()))
    }

    /// Classify a manual entry and run its effects before returning.
    pub async fn submit_scan(&mut self, id: &SessionId, raw: &str) -> Result<ScanOutcome> {
        let outcome = self.record_scan(id, raw)?;
        self.perform_effects(outcome.effects()).await;
        Ok(outcome)
    }

    /// Camera counterpart of [`AuditService::submit_scan`].
    pub async fn submit_frame(
        &mut self,
        id: &SessionId,
        raw: &str,
        at: Instant,
    ) -> Result<ScanOutcome> {
        let outcome = self.record_frame(id, raw, at)?;
        self.perform_effects(outcome.effects()).await;
        Ok(outcome)
    }

    pub async fn perform_effects(&self, effects: &[AuditEffect]) -> EffectSummary {
        perform_effects(self.provider.as_ref(), effects).await
    }

    /// Re-read the inventory for code lookups. The expected set is kept.
    pub async fn refresh_catalogue(&mut self, id: &SessionId) -> Result<()> {
        self.active_mut(id)?;
        let catalogue = self.load_catalogue().await?;
        let active = self.active_mut(id)?;
        debug!(session_id = %id, assets = catalogue.len(), "Catalogue refreshed");
        active.session.replace_catalogue(catalogue);
        Ok(())
    }

    pub fn session(&self, id: &SessionId) -> Result<&AuditSession> {
        self.active(id).map(|active| &active.session)
    }

    pub fn projection(&self, id: &SessionId) -> Result<Projection> {
        self.session(id).map(AuditSession::projection)
    }

    pub fn event_log(&self, id: &SessionId) -> Result<&[ScanEvent]> {
        self.session(id).map(AuditSession::events)
    }

    pub fn active_sessions(&self) -> impl Iterator<Item = &SessionId> {
        self.active.keys()
    }

    /// Active -> Closed. Builds the report and hands it to the record store.
    ///
    /// If the store fails the session stays active and the call can be
    /// repeated. A finished session cannot be finished again.
    pub async fn finish_session(&mut self, id: &SessionId) -> Result<FinishedAudit> {
        let report = ReconciliationReport::from_session(&self.active(id)?.session, Utc::now());

        let report_id = match self.store.save_report(&report).await {
            Ok(report_id) => report_id,
            Err(err) => {
                warn!(
                    session_id = %id,
                    error = %format!("{err:#}"),
                    "Report persistence failed; session left open"
                );
                return Err(AuditError::Persist(err));
            }
        };

        self.active.remove(id);
        self.closed.insert(id.clone(), ClosedState::Finished);
        info!(
            session_id = %id,
            report_id = %report_id,
            location = %report.location,
            expected = report.expected_count,
            found = report.found_count,
            missing = report.missing_tags.len(),
            intruders = report.intruder_tags.len(),
            status = %report.status,
            "Audit session finished"
        );
        Ok(FinishedAudit { report_id, report })
    }

    /// Drop the session and everything it recorded. Nothing is persisted.
    pub fn abandon_session(&mut self, id: &SessionId) -> Result<()> {
        let active = self
            .active
            .remove(id)
            .ok_or_else(|| self.closed.error_for(id))?;
        self.closed.insert(id.clone(), ClosedState::Abandoned);
        warn!(
            session_id = %id,
            location = %active.session.location(),
            discarded_events = active.session.events().len(),
            "Audit session abandoned"
        );
        Ok(())
    }

    async fn load_catalogue(&self) -> Result<Catalogue> {
        let records = self
            .provider
            .list_assets()
            .await
            .map_err(AuditError::Snapshot)?;
        Ok(Catalogue::from_records(records))
    }

    fn active(&self, id: &SessionId) -> Result<&ActiveSession> {
        self.active.get(id).ok_or_else(|| self.closed.error_for(id))
    }

    fn active_mut(&mut self, id: &SessionId) -> Result<&mut ActiveSession> {
        let Self { active, closed, .. } = self;
        active.get_mut(id).ok_or_else(|| closed.error_for(id))
    }
}
