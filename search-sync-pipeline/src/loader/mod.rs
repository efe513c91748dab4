//! Loader module for the sync pipeline.
//!
//! Applies routed records and deletes to the destination indices.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::errors::PipelineError;
use crate::router::Destination;
use search_sync_shared::IndexRecord;

/// Configuration for the index writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Maximum number of records passed to a single `save_objects` call.
    pub batch_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl WriterConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}

/// How destinations are updated.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteMode {
    /// Purge tags, delete ids, then save. Deletes go to every destination.
    Incremental {
        delete_ids: Vec<String>,
        purge_tags: Vec<String>,
    },
    /// Swap each destination's contents for its routed records.
    ReplaceAll,
}

/// What was done to one destination index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexOutcome {
    pub index: String,
    pub saved_ids: Vec<String>,
    pub deleted_ids: Vec<String>,
    pub purged_tags: Vec<String>,
    pub replaced: bool,
}

/// Writes routed records to their destination indices.
///
/// Destinations are written concurrently; within one destination every
/// delete completes before the first save is issued.
#[derive(Debug, Clone, Default)]
pub struct IndexWriter {
    config: WriterConfig,
}

impl IndexWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Apply `mode` to every destination.
    ///
    /// The first failure is returned; writes already made to other
    /// destinations are left in place.
    #[instrument(skip(self, destinations, mode), fields(destination_count = destinations.len()))]
    pub async fn write(
        &self,
        destinations: Vec<Destination>,
        mode: &WriteMode,
    ) -> Result<Vec<IndexOutcome>, PipelineError> {
        let writes = destinations
            .into_iter()
            .map(|destination| self.write_destination(destination, mode));
        try_join_all(writes).await
    }

    async fn write_destination(
        &self,
        destination: Destination,
        mode: &WriteMode,
    ) -> Result<IndexOutcome, PipelineError> {
        match mode {
            WriteMode::ReplaceAll => self.replace(destination).await,
            WriteMode::Incremental {
                delete_ids,
                purge_tags,
            } => self.apply(destination, delete_ids, purge_tags).await,
        }
    }

    async fn apply(
        &self,
        destination: Destination,
        delete_ids: &[String],
        purge_tags: &[String],
    ) -> Result<IndexOutcome, PipelineError> {
        let index = destination.index.as_ref();
        let name = index.name().to_string();

        // Purging before saving keeps freshly written expanded records.
        if !purge_tags.is_empty() {
            index.delete_by_tags(purge_tags).await.map_err(|source| {
                error!(index = %name, error = %source, "Failed to purge tagged records");
                PipelineError::Delete {
                    index: name.clone(),
                    source,
                }
            })?;
            debug!(index = %name, count = purge_tags.len(), "Purged tagged records");
        }

        if !delete_ids.is_empty() {
            index.delete_objects(delete_ids).await.map_err(|source| {
                error!(index = %name, error = %source, "Failed to delete records");
                PipelineError::Delete {
                    index: name.clone(),
                    source,
                }
            })?;
            debug!(index = %name, count = delete_ids.len(), "Deleted records");
        }

        for chunk in destination.records.chunks(self.config.batch_size) {
            index.save_objects(chunk).await.map_err(|source| {
                error!(index = %name, count = chunk.len(), error = %source, "Failed to save records");
                PipelineError::Write {
                    index: name.clone(),
                    source,
                }
            })?;
        }
        if !destination.records.is_empty() {
            info!(index = %name, count = destination.records.len(), "Saved records");
        }

        Ok(IndexOutcome {
            saved_ids: object_ids(&destination.records),
            deleted_ids: delete_ids.to_vec(),
            purged_tags: purge_tags.to_vec(),
            replaced: false,
            index: name,
        })
    }

    async fn replace(&self, destination: Destination) -> Result<IndexOutcome, PipelineError> {
        let index = destination.index.as_ref();
        let name = index.name().to_string();

        index
            .replace_all_objects(&destination.records)
            .await
            .map_err(|source| {
                error!(index = %name, error = %source, "Failed to replace index contents");
                PipelineError::Replace {
                    index: name.clone(),
                    source,
                }
            })?;
        info!(index = %name, count = destination.records.len(), "Replaced index contents");

        Ok(IndexOutcome {
            saved_ids: object_ids(&destination.records),
            replaced: true,
            index: name,
            ..Default::default()
        })
    }
}

fn object_ids(records: &[IndexRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(IndexRecord::object_id)
        .map(str::to_string)
        .collect()
}
