use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndex;
use search_sync_shared::IndexRecord;

/// A call received by a `MemorySearchIndex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOperation {
    /// `save_objects`, with the saved object ids in call order.
    Save(Vec<String>),
    /// `delete_objects`, with the requested ids.
    Delete(Vec<String>),
    /// `delete_by_tags`, with the requested tags.
    DeleteByTags(Vec<String>),
    /// `replace_all_objects`, with the new object ids.
    ReplaceAll(Vec<String>),
}

/// Search index held in memory.
pub struct MemorySearchIndex {
    name: String,
    records: Mutex<BTreeMap<String, IndexRecord>>,
    operations: Mutex<Vec<IndexOperation>>,
    fail_writes: AtomicBool,
}

impl MemorySearchIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(BTreeMap::new()),
            operations: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Seed records without logging an operation.
    pub async fn seed(&self, records: impl IntoIterator<Item = IndexRecord>) {
        let mut stored = self.records.lock().await;
        for record in records {
            if let Some(id) = record.object_id() {
                stored.insert(id.to_string(), record.clone());
            }
        }
    }

    /// Every call received so far, oldest first.
    pub async fn operations(&self) -> Vec<IndexOperation> {
        self.operations.lock().await.clone()
    }

    /// Current records, ordered by object id.
    pub async fn records(&self) -> Vec<IndexRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Current object ids, sorted.
    pub async fn object_ids(&self) -> Vec<String> {
        self.records.lock().await.keys().cloned().collect()
    }

    pub async fn get(&self, object_id: &str) -> Option<IndexRecord> {
        self.records.lock().await.get(object_id).cloned()
    }

    fn check_available(&self) -> Result<(), SearchIndexError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection(format!(
                "index {} is unavailable",
                self.name
            )));
        }
        Ok(())
    }

    async fn log(&self, operation: IndexOperation) {
        self.operations.lock().await.push(operation);
    }
}

/// Object ids of `records`, failing on the first record without one.
fn object_ids_of(records: &[IndexRecord]) -> Result<Vec<String>, SearchIndexError> {
    records
        .iter()
        .map(|record| {
            record
                .object_id()
                .map(str::to_string)
                .ok_or_else(|| SearchIndexError::validation("record is missing a string objectID"))
        })
        .collect()
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError> {
        self.check_available()?;
        let ids = object_ids_of(records)?;

        let mut stored = self.records.lock().await;
        for (id, record) in ids.iter().zip(records) {
            stored.insert(id.clone(), record.clone());
        }
        drop(stored);

        self.log(IndexOperation::Save(ids)).await;
        Ok(())
    }

    async fn delete_objects(&self, object_ids: &[String]) -> Result<(), SearchIndexError> {
        self.check_available()?;

        let mut stored = self.records.lock().await;
        for id in object_ids {
            stored.remove(id);
        }
        drop(stored);

        self.log(IndexOperation::Delete(object_ids.to_vec())).await;
        Ok(())
    }

    async fn delete_by_tags(&self, tags: &[String]) -> Result<(), SearchIndexError> {
        self.check_available()?;

        let mut stored = self.records.lock().await;
        stored.retain(|_, record| !record.tags().into_iter().any(|t| tags.iter().any(|tag| tag == t)));
        drop(stored);

        self.log(IndexOperation::DeleteByTags(tags.to_vec())).await;
        Ok(())
    }

    async fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError> {
        self.check_available()?;
        let ids = object_ids_of(records)?;

        let replacement: BTreeMap<String, IndexRecord> =
            ids.iter().cloned().zip(records.iter().cloned()).collect();
        *self.records.lock().await = replacement;

        self.log(IndexOperation::ReplaceAll(ids)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> IndexRecord {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let index = MemorySearchIndex::new("posts");

        index
            .save_objects(&[record(json!({ "objectID": "a" })), record(json!({ "objectID": "b" }))])
            .await
            .unwrap();
        index.delete_objects(&["a".to_string(), "missing".to_string()]).await.unwrap();

        assert_eq!(index.object_ids().await, vec!["b".to_string()]);
        assert_eq!(
            index.operations().await,
            vec![
                IndexOperation::Save(vec!["a".to_string(), "b".to_string()]),
                IndexOperation::Delete(vec!["a".to_string(), "missing".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_by_tags() {
        let index = MemorySearchIndex::new("posts");
        index
            .seed(vec![
                record(json!({ "objectID": "a-1", "_tags": ["a"] })),
                record(json!({ "objectID": "a-2", "_tags": ["a", "featured"] })),
                record(json!({ "objectID": "b-1", "_tags": ["b"] })),
            ])
            .await;

        index.delete_by_tags(&["a".to_string()]).await.unwrap();

        assert_eq!(index.object_ids().await, vec!["b-1".to_string()]);
    }

    #[tokio::test]
    async fn test_replace_all() {
        let index = MemorySearchIndex::new("posts");
        index.seed(vec![record(json!({ "objectID": "old" }))]).await;

        index.replace_all_objects(&[record(json!({ "objectID": "new" }))]).await.unwrap();

        assert_eq!(index.object_ids().await, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_save_requires_object_id() {
        let index = MemorySearchIndex::new("posts");
        let result = index.save_objects(&[record(json!({ "title": "x" }))]).await;

        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
        assert!(index.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_index() {
        let index = MemorySearchIndex::new("posts");
        index.set_failing(true);

        let result = index.delete_objects(&["a".to_string()]).await;
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }
}
