//! Error types for the shared data model.

use thiserror::Error;

/// Errors raised when a JSON value cannot be read as a source document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The value is not a JSON object.
    #[error("Document is not an object: {0}")]
    NotAnObject(String),

    /// A required system field is absent or not a string.
    #[error("Document is missing string field `{0}`")]
    MissingField(&'static str),
}

/// Errors raised when a webhook body cannot be read as a change set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// The body is not valid JSON or does not match any known shape.
    #[error("Malformed webhook payload: {0}")]
    Malformed(String),

    /// A single-document payload named an operation we do not handle.
    #[error("Unknown webhook operation: {0}")]
    UnknownOperation(String),
}

impl PayloadError {
    /// Create a malformed payload error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
