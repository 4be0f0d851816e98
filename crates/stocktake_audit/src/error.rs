//! Error types for the audit engine.

use std::fmt;

use stocktake_ids::SessionId;
use thiserror::Error;

/// Audit engine result type.
pub type Result<T> = std::result::Result<T, AuditError>;

/// How a session left the `Active` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedState {
    Finished,
    Abandoned,
}

impl fmt::Display for ClosedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedState::Finished => f.write_str("finished"),
            ClosedState::Abandoned => f.write_str("abandoned"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    /// The handle was never issued by this service.
    #[error("No audit session with id {0}")]
    UnknownSession(SessionId),

    /// Scan, finish or abandon against a session that is no longer active.
    #[error("Audit session {id} is already {state}")]
    SessionClosed { id: SessionId, state: ClosedState },

    /// The location has nothing to audit and the caller did not confirm.
    #[error("Location '{0}' has no auditable assets")]
    EmptyLocation(String),

    /// The inventory snapshot feed could not be read.
    #[error("Inventory snapshot unavailable: {0:#}")]
    Snapshot(anyhow::Error),

    /// The audit record store rejected the report. The session is still open.
    #[error("Failed to persist reconciliation report: {0:#}")]
    Persist(anyhow::Error),
}

impl AuditError {
    /// Caller contract breach rather than a domain or collaborator failure.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            AuditError::UnknownSession(_) | AuditError::SessionClosed { .. }
        )
    }
}
