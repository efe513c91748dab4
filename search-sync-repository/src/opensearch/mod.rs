//! OpenSearch implementation of the search index.
//!
//! This module provides a concrete implementation of `SearchIndex`
//! using OpenSearch as the backend.

mod client;
mod index_config;
mod queries;

pub use client::OpenSearchIndex;
pub use index_config::get_index_settings;
