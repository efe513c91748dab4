//! In-memory collaborators.
//!
//! `MemorySearchIndex` keeps records in a map and logs every call made to it,
//! so callers can assert both the resulting index state and the order of
//! operations. `MemoryDocumentStore` answers queries from a fixed document
//! set using only the query parameters.

mod document_store;
mod search_index;

pub use document_store::{MemoryDocumentStore, StoreCall};
pub use search_index::{IndexOperation, MemorySearchIndex};
