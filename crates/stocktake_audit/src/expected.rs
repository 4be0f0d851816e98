//! Expected-set construction and the per-location counts shown when an
//! operator picks where to audit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;
use crate::types::normalize_location;

/// Tags that should physically be at one location.
///
/// Frozen when the session starts. Changing location means a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSet {
    location: String,
    tags: BTreeSet<String>,
}

impl ExpectedSet {
    /// Auditable assets whose recorded location is `location`.
    pub fn build(catalogue: &Catalogue, location: &str) -> Self {
        let location = normalize_location(location);
        let tags = catalogue
            .records()
            .filter(|record| record.location == location && record.is_auditable())
            .map(|record| record.tag.clone())
            .collect();
        Self { location, tags }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Selection-screen row: how many auditable assets a location holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub location: String,
    pub auditable_count: usize,
    /// Assets recorded there but excluded (retired or promotional)
    pub excluded_count: usize,
}

impl LocationSummary {
    /// Nothing to confirm here; the UI should ask before starting.
    pub fn is_empty(&self) -> bool {
        self.auditable_count == 0
    }
}

/// Per-location counts, sorted by location name.
pub fn location_summaries(catalogue: &Catalogue) -> Vec<LocationSummary> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in catalogue.records() {
        let entry = counts.entry(record.location.as_str()).or_default();
        if record.is_auditable() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(location, (auditable_count, excluded_count))| LocationSummary {
            location: location.to_string(),
            auditable_count,
            excluded_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetCategory, AssetRecord, AssetStatus};

    fn fixture() -> Catalogue {
        Catalogue::from_records(vec![
            AssetRecord::new("A", "L", AssetStatus::InUse, AssetCategory::Corporate),
            AssetRecord::new("B", "L", AssetStatus::Maintenance, AssetCategory::Infrastructure),
            AssetRecord::new("C", "L", AssetStatus::Decommissioned, AssetCategory::Corporate),
            AssetRecord::new("D", "L", AssetStatus::Disposed, AssetCategory::Corporate),
            AssetRecord::new("E", "L", AssetStatus::InUse, AssetCategory::Promotional),
            AssetRecord::new("F", "M", AssetStatus::InUse, AssetCategory::Corporate),
        ])
    }

    #[test]
    fn test_build_applies_exclusions() {
        let expected = ExpectedSet::build(&fixture(), " L ");
        assert_eq!(expected.location(), "L");
        let tags: Vec<&str> = expected.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["A", "B"]);
    }

    #[test]
    fn test_build_unknown_location_is_empty() {
        let expected = ExpectedSet::build(&fixture(), "Nowhere");
        assert!(expected.is_empty());
    }

    #[test]
    fn test_location_summaries() {
        let summaries = location_summaries(&fixture());
        assert_eq!(
            summaries,
            vec![
                LocationSummary {
                    location: "L".to_string(),
                    auditable_count: 2,
                    excluded_count: 3,
                },
                LocationSummary {
                    location: "M".to_string(),
                    auditable_count: 1,
                    excluded_count: 0,
                },
            ]
        );
    }
}
