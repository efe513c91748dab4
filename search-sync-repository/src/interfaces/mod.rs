//! Interface definitions for the sync collaborators.
//!
//! This module defines the abstract `SearchIndex` and `DocumentStore` traits that allow
//! for dependency injection and swappable backend implementations.

mod document_store;
mod search_index;

pub use document_store::{DocumentStore, QueryParams};
pub use search_index::SearchIndex;
