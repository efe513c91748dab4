//! Configuration types for the search index backends.

/// Default tag field, matching `search_sync_shared::TAGS_FIELD`.
const DEFAULT_TAG_FIELD: &str = search_sync_shared::TAGS_FIELD;

/// Configuration for a search index backend.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of records sent in a single bulk request.
    /// Larger writes are split into several requests.
    pub max_batch_size: usize,
    /// Record field holding tags, queried by `delete_by_tags`.
    pub tag_field: String,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            tag_field: DEFAULT_TAG_FIELD.to_string(),
        }
    }
}

impl SearchIndexConfig {
    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchIndexConfig::default();
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.tag_field, "_tags");
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(SearchIndexConfig::with_max_batch_size(0).max_batch_size, 1);
    }
}
