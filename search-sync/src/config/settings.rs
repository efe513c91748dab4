//! Settings read from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::SyncError;
use search_sync_repository::HttpDocumentStoreConfig;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default content store dataset.
const DEFAULT_DATASET: &str = "production";

/// Default content store API version.
const DEFAULT_API_VERSION: &str = "2021-03-25";

/// Default pause before fetching changed documents, in milliseconds.
const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Default field marking a document as hidden.
const DEFAULT_HIDDEN_FIELD: &str = "isHidden";

/// Default maximum number of records per write.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default webhook server port, bound on all interfaces.
const DEFAULT_LISTEN_PORT: u16 = 3000;

/// Prefix of the per-type projection variables.
const PROJECTION_PREFIX: &str = "SYNC_PROJECTION_";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(SyncError::config(format!("unknown LOG_FORMAT {}", other))),
        }
    }
}

/// A document type and the index it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSetting {
    pub document_type: String,
    pub index: String,
    pub projection: Option<String>,
}

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch_url: String,
    pub content: HttpDocumentStoreConfig,
    pub routes: Vec<RouteSetting>,
    pub settle_delay: Duration,
    pub expansion: bool,
    pub hidden_field: String,
    pub batch_size: usize,
    pub webhook_secret: Option<String>,
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `CONTENT_PROJECT_ID`: content store project (required)
    /// - `CONTENT_DATASET`: dataset to read (default: production)
    /// - `CONTENT_API_VERSION`: query API version (default: 2021-03-25)
    /// - `CONTENT_TOKEN`: read token (optional)
    /// - `CONTENT_USE_CDN`: query the CDN host (default: false)
    /// - `CONTENT_API_HOST`: base URL override (optional)
    /// - `SYNC_TYPE_ROUTES`: `type:index` pairs, comma separated (required)
    /// - `SYNC_PROJECTION_<TYPE>`: field selection for a type (optional)
    /// - `SYNC_SETTLE_DELAY_MS`: pause before fetching (default: 2000)
    /// - `SYNC_EXPANSION`: one document may yield several records (default: false)
    /// - `SYNC_HIDDEN_FIELD`: field hiding a document when `true` (default: isHidden)
    /// - `SYNC_BATCH_SIZE`: maximum records per write (default: 1000)
    /// - `WEBHOOK_SECRET`: signature secret (optional; unsigned requests are accepted without it)
    /// - `LISTEN_ADDR`: webhook server address (default: 0.0.0.0:3000)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_id = var("CONTENT_PROJECT_ID")
            .ok_or_else(|| SyncError::config("CONTENT_PROJECT_ID must be set"))?;
        let content = HttpDocumentStoreConfig {
            project_id,
            dataset: var("CONTENT_DATASET").unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            api_version: var("CONTENT_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            token: var("CONTENT_TOKEN"),
            use_cdn: parse_or("CONTENT_USE_CDN", var("CONTENT_USE_CDN"), false, parse_bool)?,
            api_host: var("CONTENT_API_HOST"),
        };

        let raw_routes = var("SYNC_TYPE_ROUTES")
            .ok_or_else(|| SyncError::config("SYNC_TYPE_ROUTES must be set"))?;
        let routes = parse_routes(&raw_routes)?
            .into_iter()
            .map(|(document_type, index)| {
                let projection = var(projection_var(&document_type).as_str());
                RouteSetting {
                    document_type,
                    index,
                    projection,
                }
            })
            .collect();

        let settle_delay_ms = parse_or(
            "SYNC_SETTLE_DELAY_MS",
            var("SYNC_SETTLE_DELAY_MS"),
            DEFAULT_SETTLE_DELAY_MS,
            |v| v.parse().ok(),
        )?;
        let batch_size = parse_or(
            "SYNC_BATCH_SIZE",
            var("SYNC_BATCH_SIZE"),
            DEFAULT_BATCH_SIZE,
            |v| v.parse().ok().filter(|n: &usize| *n > 0),
        )?;
        let listen_addr = parse_or(
            "LISTEN_ADDR",
            var("LISTEN_ADDR"),
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
            |v| v.parse::<SocketAddr>().ok(),
        )?;

        Ok(Self {
            opensearch_url: var("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            content,
            routes,
            settle_delay: Duration::from_millis(settle_delay_ms),
            expansion: parse_or("SYNC_EXPANSION", var("SYNC_EXPANSION"), false, parse_bool)?,
            hidden_field: var("SYNC_HIDDEN_FIELD")
                .unwrap_or_else(|| DEFAULT_HIDDEN_FIELD.to_string()),
            batch_size,
            webhook_secret: var("WEBHOOK_SECRET"),
            listen_addr,
            log_format: var("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Distinct index names in route order.
    pub fn index_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for route in &self.routes {
            if !names.contains(&route.index.as_str()) {
                names.push(&route.index);
            }
        }
        names
    }
}

/// Parse `type:index` pairs separated by commas.
pub fn parse_routes(raw: &str) -> Result<Vec<(String, String)>, SyncError> {
    let mut routes: Vec<(String, String)> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (document_type, index) = entry
            .split_once(':')
            .map(|(t, i)| (t.trim(), i.trim()))
            .filter(|(t, i)| !t.is_empty() && !i.is_empty())
            .ok_or_else(|| SyncError::config(format!("invalid type route {}", entry)))?;

        if routes.iter().any(|(t, _)| t == document_type) {
            return Err(SyncError::config(format!(
                "type {} is routed more than once",
                document_type
            )));
        }
        routes.push((document_type.to_string(), index.to_string()));
    }

    if routes.is_empty() {
        return Err(SyncError::config("SYNC_TYPE_ROUTES has no routes"));
    }
    Ok(routes)
}

/// `SYNC_PROJECTION_` followed by the type name in upper case, with every
/// character outside `[A-Z0-9]` replaced by `_`.
pub fn projection_var(document_type: &str) -> String {
    let suffix: String = document_type
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", PROJECTION_PREFIX, suffix)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T>(
    key: &str,
    value: Option<String>,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, SyncError> {
    match value {
        None => Ok(default),
        Some(raw) => parse(&raw)
            .ok_or_else(|| SyncError::config(format!("invalid value for {}: {}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SyncError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("CONTENT_PROJECT_ID", "abc123"),
        ("SYNC_TYPE_ROUTES", "post:content, article:content ,author:people"),
    ];

    #[test]
    fn test_defaults() {
        let settings = settings(&REQUIRED).unwrap();

        assert_eq!(settings.opensearch_url, "http://localhost:9200");
        assert_eq!(settings.content.project_id, "abc123");
        assert_eq!(settings.content.dataset, "production");
        assert!(!settings.content.use_cdn);
        assert_eq!(settings.settle_delay, Duration::from_millis(2000));
        assert!(!settings.expansion);
        assert_eq!(settings.hidden_field, "isHidden");
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.webhook_secret, None);
        assert_eq!(settings.listen_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.index_names(), vec!["content", "people"]);
        assert_eq!(settings.routes[1].document_type, "article");
        assert_eq!(settings.routes[1].index, "content");
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SYNC_SETTLE_DELAY_MS", "0"),
            ("SYNC_EXPANSION", "true"),
            ("SYNC_BATCH_SIZE", "50"),
            ("CONTENT_USE_CDN", "1"),
            ("WEBHOOK_SECRET", "s3cret"),
            ("LOG_FORMAT", "json"),
            ("SYNC_PROJECTION_POST", "{ title, body }"),
        ]);
        let settings = settings(&vars).unwrap();

        assert_eq!(settings.settle_delay, Duration::ZERO);
        assert!(settings.expansion);
        assert_eq!(settings.batch_size, 50);
        assert!(settings.content.use_cdn);
        assert_eq!(settings.webhook_secret.as_deref(), Some("s3cret"));
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.routes[0].projection.as_deref(), Some("{ title, body }"));
        assert_eq!(settings.routes[1].projection, None);
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            settings(&[("SYNC_TYPE_ROUTES", "post:content")]),
            Err(SyncError::ConfigError(_))
        ));
        assert!(matches!(
            settings(&[("CONTENT_PROJECT_ID", "abc123")]),
            Err(SyncError::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SYNC_BATCH_SIZE", "0"));
        assert!(settings(&vars).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("SYNC_EXPANSION", "maybe"));
        assert!(settings(&vars).is_err());
    }

    #[test]
    fn test_parse_routes() {
        assert!(parse_routes("post").is_err());
        assert!(parse_routes("post:").is_err());
        assert!(parse_routes("post:a,post:b").is_err());
        assert!(parse_routes(" , ").is_err());
        assert_eq!(
            parse_routes("post:content,").unwrap(),
            vec![("post".to_string(), "content".to_string())]
        );
    }

    #[test]
    fn test_projection_var() {
        assert_eq!(projection_var("blogPost"), "SYNC_PROJECTION_BLOGPOST");
        assert_eq!(projection_var("sanity.imageAsset"), "SYNC_PROJECTION_SANITY_IMAGEASSET");
    }
}
