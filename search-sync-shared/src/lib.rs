//! # Search Sync Shared
//!
//! Shared types for the search sync connector: the documents read from the
//! content store, the records written to the search index, and the change
//! sets delivered by webhook notifications.

mod change_set;
mod document;
mod error;
mod record;
pub mod text;

pub use change_set::{ChangeSet, WebhookPayload};
pub use document::{Fields, SourceDocument};
pub use error::{DocumentError, PayloadError};
pub use record::{IndexRecord, OBJECT_ID_FIELD, REVISION_FIELD, TAGS_FIELD, TYPE_FIELD};
pub use text::flatten_blocks;
