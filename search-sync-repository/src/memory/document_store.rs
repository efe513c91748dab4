use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::DocumentStoreError;
use crate::interfaces::{DocumentStore, QueryParams};
use search_sync_shared::SourceDocument;

/// A query received by a `MemoryDocumentStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub query: String,
    pub params: QueryParams,
}

/// Document store answering from a fixed set of documents.
///
/// Query text is recorded but not interpreted. `fetch_documents` selects by
/// the `created`, `updated` and `types` parameters; `fetch_ids` lists the
/// published documents of the `types` parameter.
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<SourceDocument>>,
    calls: Mutex<Vec<StoreCall>>,
    failing: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self {
            documents: Mutex::new(documents),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Insert or replace a document by id.
    pub async fn put(&self, document: SourceDocument) {
        let mut documents = self.documents.lock().await;
        documents.retain(|d| d.id() != document.id());
        documents.push(document);
    }

    pub async fn remove(&self, id: &str) {
        self.documents.lock().await.retain(|d| d.id() != id);
    }

    /// Make every subsequent query fail with a request error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every query received so far, oldest first.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    async fn record_call(&self, query: &str, params: &QueryParams) -> Result<(), DocumentStoreError> {
        self.calls.lock().await.push(StoreCall {
            query: query.to_string(),
            params: params.clone(),
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::request("document store is unavailable"));
        }
        Ok(())
    }
}

/// String members of the array parameter `name`, or `None` when it is absent.
fn string_list(params: &QueryParams, name: &str) -> Option<Vec<String>> {
    params.get(name).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn type_matches(types: &Option<Vec<String>>, document: &SourceDocument) -> bool {
    types
        .as_ref()
        .map_or(true, |types| types.iter().any(|t| t == document.document_type()))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_documents(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<SourceDocument>, DocumentStoreError> {
        self.record_call(query, params).await?;

        let types = string_list(params, "types");
        let ids = match (string_list(params, "created"), string_list(params, "updated")) {
            (None, None) => None,
            (created, updated) => Some(
                created
                    .unwrap_or_default()
                    .into_iter()
                    .chain(updated.unwrap_or_default())
                    .collect::<Vec<_>>(),
            ),
        };

        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|d| type_matches(&types, d))
            .filter(|d| ids.as_ref().map_or(true, |ids| ids.iter().any(|id| id == d.id())))
            .cloned()
            .collect())
    }

    async fn fetch_ids(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<String>, DocumentStoreError> {
        self.record_call(query, params).await?;

        let types = string_list(params, "types");
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|d| !d.is_draft() && type_matches(&types, d))
            .map(|d| d.id().to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, doc_type: &str) -> SourceDocument {
        SourceDocument::try_from(json!({ "_id": id, "_type": doc_type, "_rev": "r1" })).unwrap()
    }

    fn params(value: Value) -> QueryParams {
        match value {
            Value::Object(map) => map,
            _ => QueryParams::new(),
        }
    }

    #[tokio::test]
    async fn test_fetch_by_ids_and_types() {
        let store = MemoryDocumentStore::new(vec![
            doc("a", "post"),
            doc("b", "post"),
            doc("c", "author"),
        ]);

        let docs = store
            .fetch_documents(
                "q",
                &params(json!({ "created": ["a"], "updated": ["c"], "types": ["post"] })),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(store.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_ids_skips_drafts() {
        let store = MemoryDocumentStore::new(vec![
            doc("a", "post"),
            doc("drafts.a", "post"),
            doc("c", "author"),
        ]);

        let ids = store
            .fetch_ids("q", &params(json!({ "types": ["post", "author"] })))
            .await
            .unwrap();

        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_put_replaces_by_id() {
        let store = MemoryDocumentStore::new(vec![doc("a", "post")]);
        store.put(doc("a", "article")).await;

        let docs = store.fetch_documents("q", &QueryParams::new()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].document_type(), "article");
    }

    #[tokio::test]
    async fn test_failing_store_records_call() {
        let store = MemoryDocumentStore::new(vec![]);
        store.set_failing(true);

        let result = store.fetch_ids("q", &QueryParams::new()).await;
        assert!(matches!(result, Err(DocumentStoreError::RequestError(_))));
        assert_eq!(store.calls().await.len(), 1);
    }
}
