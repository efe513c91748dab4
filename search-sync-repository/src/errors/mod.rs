//! Error types for the search sync repository.

mod document_store_error;
mod search_index_error;

pub use document_store_error::DocumentStoreError;
pub use search_index_error::SearchIndexError;
