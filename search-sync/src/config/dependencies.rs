//! Dependency initialization and wiring for the sync server.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::serializer::DefaultSerializer;
use crate::SyncError;
use search_sync_pipeline::{
    HiddenFlag, OrchestratorConfig, SyncOrchestrator, TypeRoute, TypeRoutes,
};
use search_sync_repository::{
    HttpDocumentStore, OpenSearchIndex, SearchIndex, SearchIndexConfig,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator, shared with request handlers.
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl Dependencies {
    /// Connect to OpenSearch and the content store and build the
    /// orchestrator.
    ///
    /// Every destination index is created if missing. Fails when the
    /// OpenSearch cluster is unreachable or unhealthy.
    pub async fn new(settings: &Settings) -> Result<Self, SyncError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            project_id = %settings.content.project_id,
            dataset = %settings.content.dataset,
            routes = settings.routes.len(),
            "Initializing dependencies"
        );

        let client = OpenSearchIndex::build_client(&settings.opensearch_url)
            .map_err(|e| SyncError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let mut indices: Vec<Arc<OpenSearchIndex>> = Vec::new();
        for name in settings.index_names() {
            indices.push(Arc::new(OpenSearchIndex::with_client(
                client.clone(),
                name,
                SearchIndexConfig::with_max_batch_size(settings.batch_size),
            )));
        }

        if let Some(first) = indices.first() {
            let healthy = first
                .health_check()
                .await
                .map_err(|e| SyncError::config(format!("OpenSearch health check failed: {}", e)))?;

            if !healthy {
                return Err(SyncError::config("OpenSearch cluster is unhealthy"));
            }
        }

        info!("OpenSearch connection verified");

        for index in &indices {
            index.ensure_index_exists().await?;
        }

        info!(indices = ?settings.index_names(), "Destination indices ready");

        let mut routes = TypeRoutes::new();
        for route in &settings.routes {
            let index = indices
                .iter()
                .find(|index| index.name() == route.index)
                .cloned()
                .ok_or_else(|| SyncError::config(format!("no index for route {}", route.index)))?;
            let index: Arc<dyn SearchIndex> = index;
            let type_route = match &route.projection {
                Some(projection) => TypeRoute::new(index).with_projection(projection.clone()),
                None => TypeRoute::new(index),
            };
            routes.insert(route.document_type.clone(), type_route);
        }

        let store = HttpDocumentStore::new(settings.content.clone())?;

        info!("Content store client created");

        let config = OrchestratorConfig::default()
            .with_settle_delay(settings.settle_delay)
            .with_expansion(settings.expansion)
            .with_batch_size(settings.batch_size);

        let orchestrator = SyncOrchestrator::new(
            Arc::new(store),
            routes,
            Arc::new(DefaultSerializer::default()),
            config,
        )
        .with_visibility(Arc::new(HiddenFlag::new(settings.hidden_field.clone())));

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
        })
    }
}
