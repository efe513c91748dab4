//! # Search Sync Repository
//!
//! Traits for the two collaborators of the sync pipeline, the destination
//! search index and the content store it reads from, together with their
//! OpenSearch and HTTP implementations. In-memory implementations for tests
//! are available with the `test-util` feature.

pub mod config;
pub mod content_store;
pub mod errors;
pub mod interfaces;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod opensearch;

pub use config::SearchIndexConfig;
pub use content_store::{HttpDocumentStore, HttpDocumentStoreConfig};
pub use errors::{DocumentStoreError, SearchIndexError};
pub use interfaces::{DocumentStore, QueryParams, SearchIndex};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{IndexOperation, MemoryDocumentStore, MemorySearchIndex, StoreCall};
pub use opensearch::OpenSearchIndex;
