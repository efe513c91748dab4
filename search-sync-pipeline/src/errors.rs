//! Pipeline error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use search_sync_repository::{DocumentStoreError, SearchIndexError};
use search_sync_shared::PayloadError;

/// The step of a sync call at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Payload,
    Options,
    Fetch,
    Serialize,
    Write,
    Delete,
    Replace,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Payload => "payload",
            SyncPhase::Options => "options",
            SyncPhase::Fetch => "fetch",
            SyncPhase::Serialize => "serialize",
            SyncPhase::Write => "write",
            SyncPhase::Delete => "delete",
            SyncPhase::Replace => "replace",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a sync call.
///
/// Nothing is rolled back: writes already issued to other indices stay in
/// place until the next successful sync.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The webhook body could not be read as a change set.
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    /// The sync options cannot be applied to the configured routes.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Querying the document store failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] DocumentStoreError),

    /// The serializer rejected a document or returned an unusable result.
    #[error("Serialize error for document {document_id}: {message}")]
    Serialize { document_id: String, message: String },

    /// Saving records to an index failed.
    #[error("Write error on index {index}: {source}")]
    Write {
        index: String,
        #[source]
        source: SearchIndexError,
    },

    /// Deleting records or tags from an index failed.
    #[error("Delete error on index {index}: {source}")]
    Delete {
        index: String,
        #[source]
        source: SearchIndexError,
    },

    /// Replacing an index's contents failed.
    #[error("Replace error on index {index}: {source}")]
    Replace {
        index: String,
        #[source]
        source: SearchIndexError,
    },
}

impl PipelineError {
    /// Create an invalid options error.
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Create a serialize error for a document.
    pub fn serialize(document_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialize {
            document_id: document_id.into(),
            message: msg.into(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        match self {
            PipelineError::InvalidPayload(_) => SyncPhase::Payload,
            PipelineError::InvalidOptions(_) => SyncPhase::Options,
            PipelineError::Fetch(_) => SyncPhase::Fetch,
            PipelineError::Serialize { .. } => SyncPhase::Serialize,
            PipelineError::Write { .. } => SyncPhase::Write,
            PipelineError::Delete { .. } => SyncPhase::Delete,
            PipelineError::Replace { .. } => SyncPhase::Replace,
        }
    }

    /// Whether redelivering the same change set could succeed.
    ///
    /// Input and serializer errors repeat deterministically; collaborator
    /// failures may be transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PipelineError::InvalidPayload(_)
                | PipelineError::InvalidOptions(_)
                | PipelineError::Serialize { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_mapping() {
        let err = PipelineError::Write {
            index: "posts".to_string(),
            source: SearchIndexError::WriteError("boom".to_string()),
        };
        assert_eq!(err.phase(), SyncPhase::Write);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Write error on index posts: Write error: boom");

        let err = PipelineError::serialize("post-1", "bad");
        assert_eq!(err.phase(), SyncPhase::Serialize);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_payload_error_converts() {
        let err: PipelineError = PayloadError::malformed("not json").into();
        assert_eq!(err.phase(), SyncPhase::Payload);
        assert_eq!(err.phase().to_string(), "payload");
    }
}
