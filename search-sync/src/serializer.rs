//! Serializer used by the server when no custom one is wired in.

use async_trait::async_trait;
use serde_json::Value;

use search_sync_pipeline::{BoxError, DocumentSerializer, Serialized};
use search_sync_shared::text::{flatten_blocks, is_block_array};
use search_sync_shared::{Fields, SourceDocument};

/// Copies every field whose name does not start with `_`, replacing rich
/// text block arrays with their plain text.
#[derive(Debug, Clone, Default)]
pub struct DefaultSerializer {
    remove_stop_words: bool,
}

impl DefaultSerializer {
    pub fn new(remove_stop_words: bool) -> Self {
        Self { remove_stop_words }
    }

    fn convert(&self, value: &Value) -> Value {
        match value {
            Value::Array(blocks) if is_block_array(value) => {
                Value::String(flatten_blocks(blocks, self.remove_stop_words))
            }
            other => other.clone(),
        }
    }
}

#[async_trait]
impl DocumentSerializer for DefaultSerializer {
    async fn serialize(&self, document: &SourceDocument) -> Result<Serialized, BoxError> {
        let fields: Fields = document
            .fields()
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, value)| (name.clone(), self.convert(value)))
            .collect();
        Ok(Serialized::Single(fields))
    }
}
