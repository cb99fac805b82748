//! Merging freshly fetched records into a persisted enriched catalog.

use std::collections::HashMap;

use partscatalog_shared::{CatalogEntry, RejectionSet};
use tracing::debug;

/// Merge `new` over `old`, keyed by name, then drop rejected names.
///
/// A name present in both keeps its position from `old` but takes the record
/// from `new`; names only in `new` are appended in order. Names repeated
/// within one list resolve the same way (last record wins).
pub fn merge(
    old: Vec<CatalogEntry>,
    new: Vec<CatalogEntry>,
    rejected: &RejectionSet,
) -> Vec<CatalogEntry> {
    let mut merged: Vec<CatalogEntry> = Vec::with_capacity(old.len() + new.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in old.into_iter().chain(new) {
        match positions.get(entry.name()) {
            Some(&i) => merged[i] = entry,
            None => {
                positions.insert(entry.name().to_string(), merged.len());
                merged.push(entry);
            }
        }
    }

    let before = merged.len();
    merged.retain(|entry| !rejected.contains(entry.name()));
    debug!(
        kept = merged.len(),
        dropped = before - merged.len(),
        "merged catalog"
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscatalog_shared::{ComponentRef, EnrichedComponent};

    fn enriched(name: &str, stars: u64) -> CatalogEntry {
        CatalogEntry::Enriched(EnrichedComponent {
            name: name.into(),
            repo: format!("acme/{name}"),
            github_user: "acme".into(),
            github_name: None,
            description: String::new(),
            keywords: String::new(),
            modified: "2016-01-01T00:00:00.000Z".into(),
            stars: Some(stars),
            downloads: 0,
            latest_version: "1.0.0".into(),
            platforms: None,
        })
    }

    fn fallback(name: &str) -> CatalogEntry {
        CatalogEntry::Ref(ComponentRef {
            name: name.into(),
            repo: format!("acme/{name}"),
            description: None,
            custom_description: None,
        })
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(CatalogEntry::name).collect()
    }

    #[test]
    fn newer_record_wins_and_rejected_are_dropped() {
        let old = vec![enriched("a", 1)];
        let new = vec![enriched("a", 5), enriched("b", 2)];
        let rejected: RejectionSet = ["b"].into_iter().collect();

        assert_eq!(merge(old, new, &rejected), vec![enriched("a", 5)]);
    }

    #[test]
    fn disjoint_lists_are_unioned() {
        let old = vec![enriched("a", 1), enriched("b", 2)];
        let new = vec![enriched("c", 3)];
        let merged = merge(old, new, &RejectionSet::new());
        assert_eq!(names(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let old = vec![enriched("a", 1), enriched("b", 2), enriched("c", 3)];
        let new = vec![enriched("b", 20)];
        let merged = merge(old, new, &RejectionSet::new());
        assert_eq!(names(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged[1], enriched("b", 20));
    }

    #[test]
    fn empty_new_list_only_refilters() {
        let old = vec![enriched("a", 1), fallback("spam"), enriched("c", 3)];
        let rejected: RejectionSet = ["spam"].into_iter().collect();

        let once = merge(old, Vec::new(), &rejected);
        assert_eq!(names(&once), vec!["a", "c"]);

        let twice = merge(once.clone(), Vec::new(), &rejected);
        assert_eq!(twice, once);
    }

    #[test]
    fn merge_is_idempotent() {
        let old = vec![enriched("a", 1), enriched("b", 2)];
        let new = vec![enriched("b", 7), fallback("d")];

        let first = merge(old.clone(), new.clone(), &RejectionSet::new());
        let second = merge(first.clone(), new, &RejectionSet::new());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn rejection_beats_both_sides() {
        let old = vec![enriched("x", 1)];
        let new = vec![enriched("x", 2), enriched("y", 3)];
        let rejected: RejectionSet = ["x", "y"].into_iter().collect();
        assert!(merge(old, new, &rejected).is_empty());
    }

    #[test]
    fn fallback_replaces_previous_record() {
        let old = vec![enriched("a", 1)];
        let new = vec![fallback("a")];
        let merged = merge(old, new, &RejectionSet::new());
        assert_eq!(merged, vec![fallback("a")]);
    }
}
