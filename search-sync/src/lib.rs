//! # Search Sync
//!
//! Webhook server and command line entry points for the search sync
//! connector.
//!
//! This crate wires the pipeline to OpenSearch and the content store from
//! environment configuration, and exposes it over HTTP.

pub mod config;
pub mod serializer;
pub mod server;

pub use config::{Dependencies, LogFormat, Settings};
pub use serializer::DefaultSerializer;

use thiserror::Error;

/// Errors that can occur during startup or a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] search_sync_pipeline::PipelineError),

    /// Search index error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_sync_repository::SearchIndexError),

    /// Document store error.
    #[error("Document store error: {0}")]
    StoreError(#[from] search_sync_repository::DocumentStoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
