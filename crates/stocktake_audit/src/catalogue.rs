//! Tag-indexed view over one inventory snapshot.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{normalize_location, normalize_tag, AssetRecord};

/// Every asset in a snapshot, keyed by normalized tag.
///
/// Scans are resolved against the whole catalogue, not just the expected
/// set, so that items belonging elsewhere can be told apart from labels
/// nobody has ever heard of.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    by_tag: HashMap<String, AssetRecord>,
}

impl Catalogue {
    pub fn from_records(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        let mut by_tag = HashMap::new();
        for mut record in records {
            let Some(tag) = normalize_tag(&record.tag) else {
                warn!("Skipping asset record with blank tag");
                continue;
            };
            record.tag = tag.clone();
            record.location = normalize_location(&record.location);
            if by_tag.insert(tag.clone(), record).is_some() {
                warn!(tag = %tag, "Duplicate tag in inventory snapshot; keeping the later record");
            }
        }
        Self { by_tag }
    }

    /// Look up a tag that is already normalized.
    pub fn resolve(&self, tag: &str) -> Option<&AssetRecord> {
        self.by_tag.get(tag)
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.by_tag.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetCategory, AssetStatus};

    #[test]
    fn test_resolve_uses_normalized_tags() {
        let catalogue = Catalogue::from_records(vec![
            AssetRecord::new(" nb-7 ", " Lab ", AssetStatus::InUse, AssetCategory::Corporate),
            AssetRecord::new("  ", "Lab", AssetStatus::InUse, AssetCategory::Corporate),
        ]);

        assert_eq!(catalogue.len(), 1);
        let record = catalogue.resolve("NB-7").unwrap();
        assert_eq!(record.location, "Lab");
        assert!(catalogue.resolve("nb-7").is_none());
    }

    #[test]
    fn test_duplicate_tags_keep_last() {
        let catalogue = Catalogue::from_records(vec![
            AssetRecord::new("A", "L", AssetStatus::InUse, AssetCategory::Corporate),
            AssetRecord::new("a", "M", AssetStatus::InUse, AssetCategory::Corporate),
        ]);
        assert_eq!(catalogue.resolve("A").unwrap().location, "M");
    }
}
