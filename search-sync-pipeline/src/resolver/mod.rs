//! Change set resolution.
//!
//! Given the ids of a change set and the documents fetched for its created
//! and updated ids, decide which documents are saved and which ids and tags
//! are deleted. Touched documents that are missing from the fetch or fail the
//! visibility filter are deleted, since an earlier visible revision may
//! already be indexed. A delete for a record that was never indexed is a
//! no-op.

use std::collections::HashSet;

use tracing::debug;

use crate::processor::VisibilityFilter;
use search_sync_shared::{ChangeSet, SourceDocument};

/// What a sync call must save and delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Documents to serialize and save, in fetch order.
    pub visible: Vec<SourceDocument>,
    /// Touched ids that are not being saved.
    pub hidden_ids: Vec<String>,
    /// `deleted` followed by `hidden_ids`, without duplicates.
    pub delete_ids: Vec<String>,
    /// Document ids whose expanded records are purged by tag before saving.
    /// Empty unless expansion is enabled.
    pub purge_tags: Vec<String>,
}

/// Computes a `Resolution` from a change set and fetched documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeSetResolver {
    expansion: bool,
}

impl ChangeSetResolver {
    pub fn new(expansion: bool) -> Self {
        Self { expansion }
    }

    pub fn resolve(
        &self,
        change_set: &ChangeSet,
        fetched: Vec<SourceDocument>,
        visibility: &dyn VisibilityFilter,
    ) -> Resolution {
        let touched = change_set.touched();
        let touched_set: HashSet<&str> = touched.iter().copied().collect();
        let deleted_set: HashSet<&str> = change_set.deleted.iter().map(String::as_str).collect();

        // Deleted ids are never saved, even when also listed as created.
        let mut seen = HashSet::new();
        let visible: Vec<SourceDocument> = fetched
            .into_iter()
            .filter(|d| touched_set.contains(d.id()) && !deleted_set.contains(d.id()))
            .filter(|d| seen.insert(d.id().to_string()))
            .filter(|d| visibility.is_visible(d))
            .collect();

        let visible_ids: HashSet<&str> = visible.iter().map(SourceDocument::id).collect();
        let hidden_ids: Vec<String> = touched
            .iter()
            .filter(|id| !visible_ids.contains(*id))
            .map(|id| id.to_string())
            .collect();

        let delete_ids = dedup(change_set.deleted.iter().chain(hidden_ids.iter()));

        let purge_tags = if self.expansion {
            let updated_visible = change_set
                .updated
                .iter()
                .filter(|id| visible_ids.contains(id.as_str()));
            dedup(delete_ids.iter().chain(updated_visible))
        } else {
            Vec::new()
        };

        debug!(
            touched = touched.len(),
            visible = visible.len(),
            hidden = hidden_ids.len(),
            delete = delete_ids.len(),
            purge = purge_tags.len(),
            "Resolved change set"
        );

        Resolution {
            visible,
            hidden_ids,
            delete_ids,
            purge_tags,
        }
    }
}

/// Collect ids keeping the first occurrence of each.
fn dedup<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{visibility_fn, AlwaysVisible, HiddenFlag};
    use serde_json::{json, Value};

    fn doc(value: Value) -> SourceDocument {
        SourceDocument::try_from(value).unwrap()
    }

    fn ids(docs: &[SourceDocument]) -> Vec<&str> {
        docs.iter().map(SourceDocument::id).collect()
    }

    #[test]
    fn test_hidden_document_deleted() {
        let change_set = ChangeSet::from_ids(["A"], ["B"], ["C"]);
        let fetched = vec![
            doc(json!({ "_id": "A", "_type": "post" })),
            doc(json!({ "_id": "B", "_type": "post", "isHidden": true })),
        ];

        let resolution =
            ChangeSetResolver::new(false).resolve(&change_set, fetched, &HiddenFlag::new("isHidden"));

        assert_eq!(ids(&resolution.visible), vec!["A"]);
        assert_eq!(resolution.hidden_ids, vec!["B".to_string()]);
        assert_eq!(resolution.delete_ids, vec!["C".to_string(), "B".to_string()]);
        assert!(resolution.purge_tags.is_empty());
    }

    #[test]
    fn test_overlapping_delete_and_hidden_deduplicated() {
        let change_set = ChangeSet::from_ids([], ["B", "B"], ["B"]);
        let fetched = vec![doc(json!({ "_id": "B", "_type": "post" }))];

        let resolution = ChangeSetResolver::new(false).resolve(&change_set, fetched, &AlwaysVisible);

        assert!(resolution.visible.is_empty());
        assert_eq!(resolution.delete_ids, vec!["B".to_string()]);
    }

    #[test]
    fn test_delete_wins_over_create() {
        let change_set = ChangeSet::from_ids(["A"], [], ["A"]);
        let fetched = vec![doc(json!({ "_id": "A", "_type": "post" }))];

        let resolution = ChangeSetResolver::new(false).resolve(&change_set, fetched, &AlwaysVisible);

        assert!(resolution.visible.is_empty());
        assert_eq!(resolution.delete_ids, vec!["A".to_string()]);
    }

    #[test]
    fn test_unfetched_ids_are_hidden() {
        // An unrouted type or a document removed before the fetch.
        let change_set = ChangeSet::from_ids(["A", "X"], [], []);
        let fetched = vec![doc(json!({ "_id": "A", "_type": "post" }))];

        let resolution = ChangeSetResolver::new(false).resolve(&change_set, fetched, &AlwaysVisible);

        assert_eq!(ids(&resolution.visible), vec!["A"]);
        assert_eq!(resolution.delete_ids, vec!["X".to_string()]);
    }

    #[test]
    fn test_untouched_fetch_results_ignored() {
        let change_set = ChangeSet::from_ids(["A"], [], []);
        let fetched = vec![
            doc(json!({ "_id": "A", "_type": "post" })),
            doc(json!({ "_id": "A", "_type": "post" })),
            doc(json!({ "_id": "Z", "_type": "post" })),
        ];

        let resolution = ChangeSetResolver::new(false).resolve(&change_set, fetched, &AlwaysVisible);

        assert_eq!(ids(&resolution.visible), vec!["A"]);
        assert!(resolution.delete_ids.is_empty());
    }

    #[test]
    fn test_expansion_purges_updated_visible_documents() {
        let change_set = ChangeSet::from_ids(["N"], ["U", "H"], ["D"]);
        let fetched = vec![
            doc(json!({ "_id": "N", "_type": "post" })),
            doc(json!({ "_id": "U", "_type": "post" })),
            doc(json!({ "_id": "H", "_type": "post", "draft": true })),
        ];
        let filter = visibility_fn(|d: &SourceDocument| d.get("draft").is_none());

        let resolution = ChangeSetResolver::new(true).resolve(&change_set, fetched, &filter);

        assert_eq!(ids(&resolution.visible), vec!["N", "U"]);
        assert_eq!(resolution.delete_ids, vec!["D".to_string(), "H".to_string()]);
        assert_eq!(
            resolution.purge_tags,
            vec!["D".to_string(), "H".to_string(), "U".to_string()]
        );
    }
}
