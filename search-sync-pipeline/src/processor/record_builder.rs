//! Converts source documents into index records.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use crate::processor::serializer::{DocumentSerializer, Serialized};
use search_sync_shared::{
    Fields, IndexRecord, SourceDocument, OBJECT_ID_FIELD, REVISION_FIELD, TYPE_FIELD,
};

/// The records built from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecords {
    pub document_id: String,
    /// Type of the originating document, used for routing even when the
    /// serializer overrides the record's `type` field.
    pub document_type: String,
    pub records: Vec<IndexRecord>,
}

/// Builds index records by running the serializer and merging identity
/// fields underneath its output.
pub struct RecordBuilder {
    serializer: Arc<dyn DocumentSerializer>,
    expansion: bool,
}

impl RecordBuilder {
    pub fn new(serializer: Arc<dyn DocumentSerializer>, expansion: bool) -> Self {
        Self {
            serializer,
            expansion,
        }
    }

    pub fn expansion(&self) -> bool {
        self.expansion
    }

    /// Build the records for a single document.
    ///
    /// A single serializer result gets `objectID`, `type` and `rev` defaults;
    /// an expanded result must carry an `objectID` on every element and gets
    /// the `type` and `rev` defaults only. In expansion mode every record is
    /// tagged with the document id.
    pub async fn build(&self, document: &SourceDocument) -> Result<Vec<IndexRecord>, PipelineError> {
        let serialized = self
            .serializer
            .serialize(document)
            .await
            .map_err(|e| PipelineError::serialize(document.id(), e.to_string()))?;

        let mut records = match serialized {
            Serialized::Single(fields) => {
                let mut defaults = identity_defaults(document);
                defaults.insert(
                    OBJECT_ID_FIELD.to_string(),
                    Value::String(document.id().to_string()),
                );
                vec![merge_over(defaults, fields)]
            }
            Serialized::Expanded(items) => items
                .into_iter()
                .enumerate()
                .map(|(position, fields)| {
                    if !matches!(fields.get(OBJECT_ID_FIELD), Some(Value::String(_))) {
                        return Err(PipelineError::serialize(
                            document.id(),
                            format!("expanded record {} has no string objectID", position),
                        ));
                    }
                    Ok(merge_over(identity_defaults(document), fields))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        if self.expansion {
            for record in &mut records {
                record.add_tag(document.id());
            }
        }

        Ok(records)
    }

    /// Build the records for every document, stopping at the first failure.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn build_all(
        &self,
        documents: &[SourceDocument],
    ) -> Result<Vec<DocumentRecords>, PipelineError> {
        let mut built = Vec::with_capacity(documents.len());
        for document in documents {
            let records = self.build(document).await?;
            built.push(DocumentRecords {
                document_id: document.id().to_string(),
                document_type: document.document_type().to_string(),
                records,
            });
        }

        debug!(
            record_count = built.iter().map(|b| b.records.len()).sum::<usize>(),
            "Built records"
        );
        Ok(built)
    }
}

/// `type` and `rev` taken from the document.
fn identity_defaults(document: &SourceDocument) -> Fields {
    let mut defaults = Fields::new();
    defaults.insert(
        TYPE_FIELD.to_string(),
        Value::String(document.document_type().to_string()),
    );
    if let Some(revision) = document.revision() {
        defaults.insert(REVISION_FIELD.to_string(), revision.clone());
    }
    defaults
}

/// Overlay `fields` on `defaults`; serializer fields win.
fn merge_over(mut defaults: Fields, fields: Fields) -> IndexRecord {
    defaults.extend(fields);
    IndexRecord::new(defaults)
}
