//! Source documents read from the content store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// A JSON object keyed by field name.
pub type Fields = Map<String, Value>;

const ID_FIELD: &str = "_id";
const TYPE_FIELD: &str = "_type";
const REV_FIELD: &str = "_rev";
const DRAFTS_PREFIX: &str = "drafts.";

/// A document fetched from the content store.
///
/// The connector never builds these itself; they come back from a
/// `DocumentStore` query. Construction checks that `_id` and `_type` are
/// strings so the accessors below can be infallible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SourceDocument {
    fields: Fields,
}

impl SourceDocument {
    /// Wrap a field map, validating the system fields.
    pub fn from_fields(fields: Fields) -> Result<Self, DocumentError> {
        match fields.get(ID_FIELD) {
            Some(Value::String(_)) => {}
            _ => return Err(DocumentError::MissingField(ID_FIELD)),
        }
        match fields.get(TYPE_FIELD) {
            Some(Value::String(_)) => {}
            _ => return Err(DocumentError::MissingField(TYPE_FIELD)),
        }
        Ok(Self { fields })
    }

    /// The document identifier (`_id`).
    pub fn id(&self) -> &str {
        self.str_field(ID_FIELD)
    }

    /// The document type discriminator (`_type`).
    pub fn document_type(&self) -> &str {
        self.str_field(TYPE_FIELD)
    }

    /// The revision marker (`_rev`), if the store returned one.
    pub fn revision(&self) -> Option<&Value> {
        self.fields.get(REV_FIELD)
    }

    /// Look up an arbitrary field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields of the document.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Whether this is an unpublished draft (`drafts.` id prefix).
    pub fn is_draft(&self) -> bool {
        self.id().starts_with(DRAFTS_PREFIX)
    }

    fn str_field(&self, field: &str) -> &str {
        // Presence and type are checked in `from_fields`.
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl TryFrom<Value> for SourceDocument {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(DocumentError::NotAnObject(other.to_string())),
        }
    }
}

impl From<SourceDocument> for Value {
    fn from(document: SourceDocument) -> Self {
        Value::Object(document.fields)
    }
}
