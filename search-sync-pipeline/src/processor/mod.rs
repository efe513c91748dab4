//! Processor module for the sync pipeline.
//!
//! Turns fetched documents into index records: the visibility filter decides
//! which documents are indexed, the serializer shapes their fields and the
//! record builder adds identity fields and expansion tags.

mod record_builder;
mod serializer;
mod visibility;

pub use record_builder::{DocumentRecords, RecordBuilder};
pub use serializer::{
    async_serializer_fn, serializer_fn, AsyncFnSerializer, BoxError, DocumentSerializer,
    FnSerializer, Serialized,
};
pub use visibility::{visibility_fn, AlwaysVisible, FnVisibility, HiddenFlag, VisibilityFilter};
