//! Document store trait definition.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::DocumentStoreError;
use search_sync_shared::SourceDocument;

/// Named query parameters, bound as `$name` inside the query.
pub type QueryParams = Map<String, Value>;

/// The source-of-truth content store.
///
/// The query language is opaque to the connector: it builds query strings
/// and parameter maps and hands them over unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a query returning full documents.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SourceDocument>)` - The matching documents, in store order
    /// * `Err(DocumentStoreError)` - If the query fails or a result is not a valid document
    async fn fetch_documents(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<SourceDocument>, DocumentStoreError>;

    /// Run a query returning a flat list of document ids.
    async fn fetch_ids(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<String>, DocumentStoreError>;
}
