//! # Search Sync Pipeline
//!
//! This crate reconciles a search index with a content store, one change set
//! at a time.
//!
//! ## Architecture
//!
//! A sync call flows in one direction:
//!
//! 1. **Orchestrator**: waits for the store to settle, then fetches touched documents
//! 2. **Resolver**: splits them into documents to save and ids/tags to delete
//! 3. **Processor**: filters by visibility and serializes documents into records
//! 4. **Router**: groups records by destination index
//! 5. **Loader**: purges, deletes and saves per destination

pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod query;
pub mod resolver;
pub mod router;

pub use errors::{PipelineError, SyncPhase};
pub use loader::{IndexOutcome, IndexWriter, WriteMode, WriterConfig};
pub use orchestrator::{OrchestratorConfig, SyncOptions, SyncOrchestrator, SyncOutcome};
pub use processor::{
    async_serializer_fn, serializer_fn, visibility_fn, AlwaysVisible, BoxError, DocumentRecords,
    DocumentSerializer, HiddenFlag, RecordBuilder, Serialized, VisibilityFilter,
};
pub use resolver::{ChangeSetResolver, Resolution};
pub use router::{Destination, IndexRouter, TypeRoute, TypeRoutes};
