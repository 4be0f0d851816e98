//! Scan classification.
//!
//! `classify` decides what a decoded code means for a session without
//! touching it. The session applies the decision; side effects come back as
//! data for the caller to run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::AuditSession;
use crate::types::normalize_tag;

/// What a recorded scan meant for the audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanClassification {
    /// Expected here and seen for the first time
    Confirmed,
    /// Belongs here and was already seen
    Duplicate,
    /// Recognized asset recorded at another location
    Intruder,
    /// No catalogue entry for this code
    Unknown,
}

impl ScanClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanClassification::Confirmed => "confirmed",
            ScanClassification::Duplicate => "duplicate",
            ScanClassification::Intruder => "intruder",
            ScanClassification::Unknown => "unknown",
        }
    }

    /// Whether applying this classification adds the tag to the seen set.
    pub fn marks_seen(&self) -> bool {
        matches!(
            self,
            ScanClassification::Confirmed | ScanClassification::Intruder
        )
    }
}

impl fmt::Display for ScanClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a session's chronological audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Normalized code (trimmed, uppercased)
    pub code: String,
    pub timestamp: DateTime<Utc>,
    pub classification: ScanClassification,
    /// Location the catalogue records for the code, when it resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_location: Option<String>,
}

/// Side effect requested by a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEffect {
    /// Stamp the asset's "last audited" marker in the inventory.
    MarkAudited { tag: String, at: DateTime<Utc> },
}

/// Why a submitted code produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Nothing left after trimming; scanner noise
    Blank,
    /// Camera redelivered a code inside the debounce window
    Debounced,
    /// Promotional item recorded at another location
    PromotionalElsewhere,
}

/// Result of submitting one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Recorded {
        event: ScanEvent,
        effects: Vec<AuditEffect>,
    },
    Ignored(IgnoreReason),
}

impl ScanOutcome {
    pub fn event(&self) -> Option<&ScanEvent> {
        match self {
            ScanOutcome::Recorded { event, .. } => Some(event),
            ScanOutcome::Ignored(_) => None,
        }
    }

    pub fn classification(&self) -> Option<ScanClassification> {
        self.event().map(|event| event.classification)
    }

    pub fn effects(&self) -> &[AuditEffect] {
        match self {
            ScanOutcome::Recorded { effects, .. } => effects,
            ScanOutcome::Ignored(_) => &[],
        }
    }
}

/// Decide what `raw` means for `session`. First matching rule wins:
///
/// 1. blank after trimming -> ignored, no event
/// 2. no catalogue record -> `Unknown`
/// 3. recorded at the session location -> `Duplicate` if already seen,
///    otherwise `Confirmed` plus a `MarkAudited` effect
/// 4. recorded elsewhere, promotional -> ignored
/// 5. recorded elsewhere -> `Intruder`
pub fn classify(session: &AuditSession, raw: &str, at: DateTime<Utc>) -> ScanOutcome {
    let Some(code) = normalize_tag(raw) else {
        return ScanOutcome::Ignored(IgnoreReason::Blank);
    };

    let Some(record) = session.catalogue().resolve(&code) else {
        return recorded(code, at, ScanClassification::Unknown, None, Vec::new());
    };
    let recorded_location = Some(record.location.clone());

    if record.location == session.location() {
        if session.has_seen(&code) {
            return recorded(
                code,
                at,
                ScanClassification::Duplicate,
                recorded_location,
                Vec::new(),
            );
        }
        let effects = vec![AuditEffect::MarkAudited {
            tag: code.clone(),
            at,
        }];
        return recorded(
            code,
            at,
            ScanClassification::Confirmed,
            recorded_location,
            effects,
        );
    }

    if record.is_promotional() {
        return ScanOutcome::Ignored(IgnoreReason::PromotionalElsewhere);
    }

    recorded(
        code,
        at,
        ScanClassification::Intruder,
        recorded_location,
        Vec::new(),
    )
}

fn recorded(
    code: String,
    timestamp: DateTime<Utc>,
    classification: ScanClassification,
    recorded_location: Option<String>,
    effects: Vec<AuditEffect>,
) -> ScanOutcome {
    ScanOutcome::Recorded {
        event: ScanEvent {
            code,
            timestamp,
            classification,
            recorded_location,
        },
        effects,
    }
}
