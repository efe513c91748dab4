//! Orchestrator module for the sync pipeline.
//!
//! Sequences fetch, resolve, build, route and write for a change set, and
//! exposes the full reindex built on the same path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::errors::PipelineError;
use crate::loader::{IndexOutcome, IndexWriter, WriteMode, WriterConfig};
use crate::processor::{AlwaysVisible, DocumentSerializer, RecordBuilder, VisibilityFilter};
use crate::query::{build_fetch_query, LIST_IDS_QUERY};
use crate::resolver::ChangeSetResolver;
use crate::router::{IndexRouter, TypeRoutes};
use search_sync_repository::{DocumentStore, QueryParams};
use search_sync_shared::{ChangeSet, IndexRecord, SourceDocument, WebhookPayload};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause before fetching, letting the document store catch up with the
    /// mutation that triggered the webhook.
    pub settle_delay: Duration,
    /// One document may yield several records, tracked by tag.
    pub expansion: bool,
    /// Maximum records per save call.
    pub batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(2000),
            expansion: false,
            batch_size: 1000,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_expansion(mut self, expansion: bool) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Replace each destination's contents instead of deleting and saving.
    pub replace_all: bool,
    /// Overrides the configured settle delay.
    pub settle_delay: Option<Duration>,
    /// Restrict the call to these configured types.
    pub type_filter: Option<Vec<String>>,
    /// Extra parameters passed through to document store queries.
    pub extra_params: QueryParams,
}

impl SyncOptions {
    pub fn with_replace_all(mut self, replace_all: bool) -> Self {
        self.replace_all = replace_all;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = Some(settle_delay);
        self
    }

    pub fn with_type_filter<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.type_filter = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra_params.insert(name.into(), value);
        self
    }
}

/// Result of a sync call, one entry per destination index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub indices: Vec<IndexOutcome>,
}

impl SyncOutcome {
    pub fn index(&self, name: &str) -> Option<&IndexOutcome> {
        self.indices.iter().find(|i| i.index == name)
    }

    pub fn saved_count(&self) -> usize {
        self.indices.iter().map(|i| i.saved_ids.len()).sum()
    }

    /// Distinct ids deleted, however many indices each was sent to.
    pub fn deleted_count(&self) -> usize {
        self.indices
            .iter()
            .flat_map(|i| i.deleted_ids.iter())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Entry point of the pipeline.
///
/// Holds no state between calls; concurrent calls are not coordinated.
pub struct SyncOrchestrator {
    store: Arc<dyn DocumentStore>,
    router: IndexRouter,
    builder: RecordBuilder,
    visibility: Arc<dyn VisibilityFilter>,
    resolver: ChangeSetResolver,
    writer: IndexWriter,
    config: OrchestratorConfig,
}

impl SyncOrchestrator {
    /// Create an orchestrator where every document is visible.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        routes: TypeRoutes,
        serializer: Arc<dyn DocumentSerializer>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            router: IndexRouter::new(routes),
            builder: RecordBuilder::new(serializer, config.expansion),
            visibility: Arc::new(AlwaysVisible),
            resolver: ChangeSetResolver::new(config.expansion),
            writer: IndexWriter::new(WriterConfig::with_batch_size(config.batch_size)),
            config,
        }
    }

    pub fn with_visibility(mut self, visibility: Arc<dyn VisibilityFilter>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn routes(&self) -> &TypeRoutes {
        self.router.routes()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Parse a raw webhook body and sync it.
    pub async fn sync_payload(
        &self,
        body: &[u8],
        options: &SyncOptions,
    ) -> Result<SyncOutcome, PipelineError> {
        let change_set = WebhookPayload::parse(body)?;
        self.webhook_sync(&change_set, options).await
    }

    /// Bring the index in line with a change set.
    #[instrument(
        skip(self, change_set, options),
        fields(
            created = change_set.created.len(),
            updated = change_set.updated.len(),
            deleted = change_set.deleted.len(),
            replace_all = options.replace_all
        )
    )]
    pub async fn webhook_sync(
        &self,
        change_set: &ChangeSet,
        options: &SyncOptions,
    ) -> Result<SyncOutcome, PipelineError> {
        let types = self
            .router
            .select_types(options.type_filter.as_deref(), options.replace_all)?;

        let fetched = if change_set.touched().is_empty() {
            Vec::new()
        } else {
            let delay = options.settle_delay.unwrap_or(self.config.settle_delay);
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "Waiting for document store to settle");
                tokio::time::sleep(delay).await;
            }
            self.fetch(change_set, &types, &options.extra_params).await?
        };

        let resolution = self
            .resolver
            .resolve(change_set, fetched, self.visibility.as_ref());
        let built = self.builder.build_all(&resolution.visible).await?;
        let destinations = self.router.route(&types, built);

        let mode = if options.replace_all {
            WriteMode::ReplaceAll
        } else {
            WriteMode::Incremental {
                delete_ids: resolution.delete_ids,
                purge_tags: resolution.purge_tags,
            }
        };
        let indices = self.writer.write(destinations, &mode).await?;
        let outcome = SyncOutcome { indices };

        info!(
            saved = outcome.saved_count(),
            deleted = outcome.deleted_count(),
            indices = outcome.indices.len(),
            "Sync complete"
        );
        Ok(outcome)
    }

    /// Sync every published document of the active types.
    ///
    /// All listed ids are treated as created. No settle delay is applied
    /// unless `options` sets one.
    #[instrument(skip(self, options), fields(replace_all = options.replace_all))]
    pub async fn reindex(&self, options: &SyncOptions) -> Result<SyncOutcome, PipelineError> {
        let types = self
            .router
            .select_types(options.type_filter.as_deref(), options.replace_all)?;

        let mut params = options.extra_params.clone();
        params.insert("types".to_string(), string_array(&types));
        let ids = self.store.fetch_ids(LIST_IDS_QUERY, &params).await?;
        info!(count = ids.len(), "Listed documents for reindex");

        let options = SyncOptions {
            settle_delay: Some(options.settle_delay.unwrap_or(Duration::ZERO)),
            ..options.clone()
        };
        self.webhook_sync(&ChangeSet::created(ids), &options).await
    }

    /// Build the records for `documents` without writing them.
    pub async fn transform(
        &self,
        documents: &[SourceDocument],
    ) -> Result<Vec<IndexRecord>, PipelineError> {
        let built = self.builder.build_all(documents).await?;
        Ok(built.into_iter().flat_map(|b| b.records).collect())
    }

    async fn fetch(
        &self,
        change_set: &ChangeSet,
        types: &[String],
        extra_params: &QueryParams,
    ) -> Result<Vec<SourceDocument>, PipelineError> {
        let query = build_fetch_query(self.router.routes(), types);

        let mut params = extra_params.clone();
        params.insert("created".to_string(), string_array(&change_set.created));
        params.insert("updated".to_string(), string_array(&change_set.updated));
        params.insert("types".to_string(), string_array(types));

        let documents = self.store.fetch_documents(&query, &params).await?;
        debug!(count = documents.len(), "Fetched documents");
        Ok(documents)
    }
}

fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
