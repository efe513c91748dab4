//! Content store HTTP client.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};
use url::Url;

use crate::errors::DocumentStoreError;
use crate::interfaces::{DocumentStore, QueryParams};
use search_sync_shared::SourceDocument;

/// Default API version path segment.
const DEFAULT_API_VERSION: &str = "2021-03-25";

/// Default dataset name.
const DEFAULT_DATASET: &str = "production";

/// Connection settings for the content store.
#[derive(Debug, Clone)]
pub struct HttpDocumentStoreConfig {
    /// Project identifier, used to derive the API host.
    pub project_id: String,
    /// Dataset to query.
    pub dataset: String,
    /// Dated API version, without the leading `v`.
    pub api_version: String,
    /// Read token for private datasets.
    pub token: Option<String>,
    /// Query the CDN host instead of the live API. Reads may then lag writes
    /// further, so this is off by default.
    pub use_cdn: bool,
    /// Full base URL overriding the derived host (used for tests and proxies).
    pub api_host: Option<String>,
}

impl Default for HttpDocumentStoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: DEFAULT_DATASET.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            use_cdn: false,
            api_host: None,
        }
    }
}

impl HttpDocumentStoreConfig {
    /// Config for a project with all other settings at their defaults.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// The base URL requests are sent to.
    fn base_url(&self) -> String {
        match &self.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None if self.use_cdn => format!("https://{}.apicdn.sanity.io", self.project_id),
            None => format!("https://{}.api.sanity.io", self.project_id),
        }
    }

    /// The query endpoint URL.
    pub fn query_url(&self) -> Result<Url, DocumentStoreError> {
        if self.api_host.is_none() && self.project_id.is_empty() {
            return Err(DocumentStoreError::config("project_id is required"));
        }
        if self.dataset.is_empty() {
            return Err(DocumentStoreError::config("dataset is required"));
        }

        let raw = format!(
            "{}/v{}/data/query/{}",
            self.base_url(),
            self.api_version.trim_start_matches('v'),
            self.dataset
        );
        Url::parse(&raw).map_err(|e| DocumentStoreError::config(format!("{}: {}", raw, e)))
    }
}

/// Document store backed by the content store's HTTP query API.
pub struct HttpDocumentStore {
    http: reqwest::Client,
    query_url: Url,
    token: Option<String>,
}

impl HttpDocumentStore {
    /// Create a client for the configured project and dataset.
    pub fn new(config: HttpDocumentStoreConfig) -> Result<Self, DocumentStoreError> {
        let query_url = config.query_url()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DocumentStoreError::config(e.to_string()))?;

        Ok(Self {
            http,
            query_url,
            token: config.token,
        })
    }

    /// Run a query and return its `result` member.
    #[instrument(skip(self, params), fields(url = %self.query_url))]
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, DocumentStoreError> {
        let mut request = self
            .http
            .post(self.query_url.clone())
            .json(&json!({ "query": query, "params": params }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DocumentStoreError::request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Content store query failed");
            return Err(DocumentStoreError::StatusError {
                status: status.as_u16(),
                body,
            });
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| DocumentStoreError::decode(e.to_string()))?;

        body.get_mut("result")
            .map(Value::take)
            .ok_or_else(|| DocumentStoreError::decode("response has no `result` member"))
    }
}

/// Read a query result as a list; `null` means no matches.
fn into_items(result: Value) -> Result<Vec<Value>, DocumentStoreError> {
    match result {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(DocumentStoreError::decode(format!(
            "expected an array result, got {}",
            other
        ))),
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch_documents(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<SourceDocument>, DocumentStoreError> {
        let items = into_items(self.query(query, params).await?)?;
        let documents = items
            .into_iter()
            .map(SourceDocument::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = documents.len(), "Fetched documents");
        Ok(documents)
    }

    async fn fetch_ids(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<String>, DocumentStoreError> {
        let items = into_items(self.query(query, params).await?)?;
        items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok(id),
                other => Err(DocumentStoreError::decode(format!(
                    "expected a string id, got {}",
                    other
                ))),
            })
            .collect()
    }
}
