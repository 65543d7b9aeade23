use std::collections::HashSet;

use super::index::{AssetRecord, ManifestIndex};

/// One physical object to materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// First key (in key order) that resolved to this path.
    pub key: String,
    pub hash: String,
    pub size: u64,
    /// Relative object path, `<hash[0..2]>/<hash>`.
    pub path: String,
}

impl From<&AssetRecord> for PlanEntry {
    fn from(record: &AssetRecord) -> Self {
        Self {
            key: record.key().to_string(),
            hash: record.hash().to_string(),
            size: record.size(),
            path: record.path().to_string(),
        }
    }
}

/// Distinct objects of a manifest, first occurrence by key wins.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    entries: Vec<PlanEntry>,
    shared: usize,
}

impl SyncPlan {
    pub fn build(manifest: &ManifestIndex) -> Self {
        let mut seen = HashSet::with_capacity(manifest.len());
        let mut entries = Vec::with_capacity(manifest.len());
        let mut shared = 0;

        for record in manifest.records() {
            if seen.insert(record.path()) {
                entries.push(PlanEntry::from(record));
            } else {
                shared += 1;
            }
        }

        Self { entries, shared }
    }

    pub fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that share a path with an earlier key and are not materialized.
    pub fn shared_keys(&self) -> usize {
        self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::index::AssetObject;

    fn manifest(entries: &[(&str, &str, u64)]) -> ManifestIndex {
        ManifestIndex::from_objects(entries.iter().map(|(k, h, s)| {
            (
                k.to_string(),
                AssetObject {
                    hash: h.to_string(),
                    size: *s,
                },
            )
        }))
        .unwrap()
    }

    #[test]
    fn shared_hashes_collapse_to_first_key() {
        let a = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
        let b = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2";
        let plan = SyncPlan::build(&manifest(&[
            ("z/late", a, 10),
            ("c", b, 20),
            ("a/early", a, 10),
        ]));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.shared_keys(), 1);
        let entries = plan.into_entries();
        assert_eq!(entries[0].key, "a/early");
        assert_eq!(entries[0].path, format!("aa/{a}"));
        assert_eq!(entries[1].key, "c");
    }

    #[test]
    fn empty_manifest_gives_empty_plan() {
        let plan = SyncPlan::build(&ManifestIndex::default());
        assert!(plan.is_empty());
        assert_eq!(plan.shared_keys(), 0);
    }
}
