//! In-memory state of one audit session and its derived projections.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stocktake_ids::SessionId;
use tracing::debug;

use crate::catalogue::Catalogue;
use crate::classifier::{classify, ScanOutcome, ScanEvent};
use crate::expected::ExpectedSet;
use crate::types::normalize_location;

/// A scanned asset recorded at another location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntruderTag {
    pub tag: String,
    /// Where the system of record says the asset is
    pub location: String,
}

/// Live counters shown to the operator. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub found_tags: Vec<String>,
    pub missing_tags: Vec<String>,
    pub intruder_tags: Vec<IntruderTag>,
    pub progress_percent: u8,
}

impl Projection {
    pub fn expected_count(&self) -> usize {
        self.found_tags.len() + self.missing_tags.len()
    }
}

/// One operator auditing one location.
///
/// `seen` only grows and `events` is append-only. Both are touched solely
/// through [`AuditSession::submit`].
#[derive(Debug, Clone)]
pub struct AuditSession {
    id: SessionId,
    location: String,
    expected: ExpectedSet,
    catalogue: Catalogue,
    seen: BTreeSet<String>,
    events: Vec<ScanEvent>,
    started_at: DateTime<Utc>,
}

impl AuditSession {
    /// Open a session for `location` against a catalogue snapshot.
    pub fn start(location: &str, catalogue: Catalogue) -> Self {
        let location = normalize_location(location);
        let expected = ExpectedSet::build(&catalogue, &location);
        Self {
            id: SessionId::new(),
            location,
            expected,
            catalogue,
            seen: BTreeSet::new(),
            events: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn expected(&self) -> &ExpectedSet {
        &self.expected
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn has_seen(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }

    pub fn seen_tags(&self) -> &BTreeSet<String> {
        &self.seen
    }

    pub fn events(&self) -> &[ScanEvent] {
        &self.events
    }

    /// Swap in a fresher catalogue for lookups. The expected set is not
    /// rebuilt; it stays as it was when the session started.
    pub fn replace_catalogue(&mut self, catalogue: Catalogue) {
        self.catalogue = catalogue;
    }

    /// Classify `raw` and apply the result.
    pub fn submit(&mut self, raw: &str, at: DateTime<Utc>) -> ScanOutcome {
        let outcome = classify(self, raw, at);
        if let ScanOutcome::Recorded { event, .. } = &outcome {
            if event.classification.marks_seen() {
                self.seen.insert(event.code.clone());
            }
            debug!(
                session_id = %self.id,
                code = %event.code,
                classification = %event.classification,
                "Scan recorded"
            );
            self.events.push(event.clone());
        }
        outcome
    }

    /// Expected tags that have been seen.
    pub fn found_tags(&self) -> Vec<String> {
        self.expected
            .tags()
            .intersection(&self.seen)
            .cloned()
            .collect()
    }

    /// Expected tags not seen yet.
    pub fn missing_tags(&self) -> Vec<String> {
        self.expected
            .tags()
            .difference(&self.seen)
            .cloned()
            .collect()
    }

    /// Seen tags whose catalogue location differs from this session's.
    pub fn intruder_tags(&self) -> Vec<IntruderTag> {
        self.seen
            .iter()
            .filter_map(|tag| {
                let record = self.catalogue.resolve(tag)?;
                (record.location != self.location).then(|| IntruderTag {
                    tag: tag.clone(),
                    location: record.location.clone(),
                })
            })
            .collect()
    }

    pub fn progress_percent(&self) -> u8 {
        let found = self.expected.tags().intersection(&self.seen).count();
        progress_percent(found, self.expected.len())
    }

    pub fn projection(&self) -> Projection {
        let found_tags = self.found_tags();
        let progress_percent = progress_percent(found_tags.len(), self.expected.len());
        Projection {
            found_tags,
            missing_tags: self.missing_tags(),
            intruder_tags: self.intruder_tags(),
            progress_percent,
        }
    }
}

/// `round(100 * found / expected)`, 0 for an empty expected set.
///
/// Never 100 while anything is missing: 199 of 200 reports 99, not 100.
pub fn progress_percent(found: usize, expected: usize) -> u8 {
    if expected == 0 {
        return 0;
    }
    if found >= expected {
        return 100;
    }
    let (found, expected) = (found as u64, expected as u64);
    let rounded = (200 * found + expected) / (2 * expected);
    rounded.min(99) as u8
}
