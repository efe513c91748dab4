//! Search index trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use search_sync_shared::IndexRecord;

/// A destination index that records are written to and deleted from.
///
/// Implementations are shared as `Arc<dyn SearchIndex>` between every
/// document type routed to them. Two handles with the same `name()` are
/// treated as the same destination when grouping writes.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations. Retrying is left to the implementation.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Name identifying the destination index.
    fn name(&self) -> &str;

    /// Upsert records keyed by their `objectID`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every record was written
    /// * `Err(SearchIndexError)` - If the write failed, fully or for some records
    async fn save_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError>;

    /// Delete records by `objectID`.
    ///
    /// Ids that are not present in the index are ignored.
    async fn delete_objects(&self, object_ids: &[String]) -> Result<(), SearchIndexError>;

    /// Delete every record carrying any of the given tags.
    ///
    /// Tags with no matching record are ignored.
    async fn delete_by_tags(&self, tags: &[String]) -> Result<(), SearchIndexError>;

    /// Replace the whole contents of the index with `records`.
    ///
    /// After success the index holds exactly these records. Used by full
    /// reindexing only.
    async fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError>;
}
