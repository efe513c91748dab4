//! Document store error types.

use search_sync_shared::DocumentError;
use thiserror::Error;

/// Errors that can occur while querying the content store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Invalid client configuration (bad URL, missing project).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request could not be sent or the connection failed.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The store answered with a non-success status.
    #[error("Query failed with status {status}: {body}")]
    StatusError { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A returned document is missing its system fields.
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
}

impl DocumentStoreError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}
