//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndex`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::{Conflicts, Refresh},
    BulkParts, DeleteByQueryParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndex;
use crate::opensearch::index_config::get_index_settings;
use crate::opensearch::queries::{
    build_bulk_delete_body, build_bulk_index_body, build_stale_records_query, build_tag_query,
    bulk_failures,
};
use search_sync_shared::IndexRecord;

/// A destination index stored in OpenSearch.
///
/// Records are stored with their `objectID` as the document `_id`. Several
/// `OpenSearchIndex` values can share one `OpenSearch` client (it is cheap to
/// clone), one per destination index name.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchIndex::build_client("http://localhost:9200")?;
/// let posts = OpenSearchIndex::with_client(client.clone(), "posts", SearchIndexConfig::default());
/// posts.ensure_index_exists().await?;
/// posts.save_objects(&records).await?;
/// ```
pub struct OpenSearchIndex {
    client: OpenSearch,
    name: String,
    config: SearchIndexConfig,
}

impl OpenSearchIndex {
    /// Build an OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearch)` - A client that can be shared between indices
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub fn build_client(url: &str) -> Result<OpenSearch, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch client");
        Ok(OpenSearch::new(transport))
    }

    /// Connect a single index with its own client.
    pub fn connect(
        url: &str,
        name: impl Into<String>,
        config: SearchIndexConfig,
    ) -> Result<Self, SearchIndexError> {
        let client = Self::build_client(url)?;
        Ok(Self::with_client(client, name, config))
    }

    /// Wrap an existing client for the named index.
    pub fn with_client(client: OpenSearch, name: impl Into<String>, config: SearchIndexConfig) -> Self {
        Self {
            client,
            name: name.into(),
            config,
        }
    }

    /// Ensure the index exists, creating it with the identity field mappings.
    ///
    /// This should be called during application startup.
    #[instrument(skip(self), fields(index = %self.name))]
    pub async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!("Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.name))
            .body(get_index_settings(&self.config.tag_field))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another instance may have created it in the meantime.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::connection(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!("Created index");
        Ok(())
    }

    /// Check if the cluster is reachable and not red.
    pub async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(status = %status, "OpenSearch cluster status");
        Ok(status == "green" || status == "yellow")
    }

    /// Send a bulk body and turn item-level failures into an error.
    async fn send_bulk(
        &self,
        body: Vec<JsonBody<Value>>,
        to_error: fn(String) -> SearchIndexError,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(&self.name))
            .refresh(Refresh::WaitFor)
            .body(body)
            .send()
            .await
            .map_err(|e| to_error(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %self.name, status = %status, body = %error_body, "Bulk request failed");
            return Err(to_error(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let failures = bulk_failures(&response_body);
        if !failures.is_empty() {
            error!(index = %self.name, failed = failures.len(), "Bulk request had item failures");
            return Err(SearchIndexError::bulk_operation(format!(
                "{} of the bulk items failed: {}",
                failures.len(),
                failures.join("; ")
            )));
        }

        Ok(())
    }

    /// Delete every record matching `query`, returning how many were removed.
    ///
    /// A missing index counts as nothing to delete.
    async fn delete_matching(
        &self,
        query: Value,
        to_error: fn(String) -> SearchIndexError,
    ) -> Result<u64, SearchIndexError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[&self.name]))
            .conflicts(Conflicts::Proceed)
            .refresh(true)
            .body(query)
            .send()
            .await
            .map_err(|e| to_error(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(0);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %self.name, status = %status, body = %error_body, "Delete by query failed");
            return Err(to_error(format!(
                "Delete by query failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        Ok(response_body
            .get("deleted")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl SearchIndex for OpenSearchIndex {
    fn name(&self) -> &str {
        &self.name
    }

    /// Index records in chunks of `max_batch_size`, keyed by `objectID`.
    async fn save_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError> {
        for chunk in records.chunks(self.config.max_batch_size) {
            let body = build_bulk_index_body(chunk)?;
            self.send_bulk(body, SearchIndexError::WriteError).await?;
        }

        debug!(index = %self.name, count = records.len(), "Records saved");
        Ok(())
    }

    async fn delete_objects(&self, object_ids: &[String]) -> Result<(), SearchIndexError> {
        for chunk in object_ids.chunks(self.config.max_batch_size) {
            let body = build_bulk_delete_body(chunk);
            self.send_bulk(body, SearchIndexError::DeleteError).await?;
        }

        debug!(index = %self.name, count = object_ids.len(), "Records deleted");
        Ok(())
    }

    async fn delete_by_tags(&self, tags: &[String]) -> Result<(), SearchIndexError> {
        if tags.is_empty() {
            return Ok(());
        }

        let query = build_tag_query(&self.config.tag_field, tags);
        let deleted = self
            .delete_matching(query, SearchIndexError::DeleteError)
            .await?;

        debug!(index = %self.name, tags = tags.len(), deleted, "Tagged records deleted");
        Ok(())
    }

    /// Write every record, then drop whatever the index held that was not rewritten.
    async fn replace_all_objects(&self, records: &[IndexRecord]) -> Result<(), SearchIndexError> {
        for chunk in records.chunks(self.config.max_batch_size) {
            let body = build_bulk_index_body(chunk)?;
            self.send_bulk(body, SearchIndexError::ReplaceError).await?;
        }

        let keep_ids: Vec<&str> = records.iter().filter_map(IndexRecord::object_id).collect();
        let query = build_stale_records_query(&keep_ids);
        let removed = self
            .delete_matching(query, SearchIndexError::ReplaceError)
            .await?;

        info!(
            index = %self.name,
            written = records.len(),
            removed,
            "Index contents replaced"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_url_rejected() {
        let result = OpenSearchIndex::connect("not a url", "posts", SearchIndexConfig::default());
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }

    #[test]
    fn test_name() {
        let index =
            OpenSearchIndex::connect("http://localhost:9200", "posts", SearchIndexConfig::default())
                .unwrap();
        assert_eq!(index.name(), "posts");
    }

    #[test]
    fn test_empty_id_list_builds_match_all_stale_query() {
        let query = build_stale_records_query(&[]);
        assert_eq!(query["query"]["bool"]["must_not"]["ids"]["values"], json!([]));
    }
}
