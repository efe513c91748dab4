//! Records written to the search index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Fields;

/// Externally unique record identifier.
pub const OBJECT_ID_FIELD: &str = "objectID";
/// Type of the originating document.
pub const TYPE_FIELD: &str = "type";
/// Revision of the originating document.
pub const REVISION_FIELD: &str = "rev";
/// Tag list; carries the originating document id in expansion mode.
pub const TAGS_FIELD: &str = "_tags";

/// One entry in the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRecord(Fields);

impl IndexRecord {
    pub fn new(fields: Fields) -> Self {
        Self(fields)
    }

    /// The record identifier, when present and a string.
    pub fn object_id(&self) -> Option<&str> {
        self.0.get(OBJECT_ID_FIELD).and_then(Value::as_str)
    }

    /// String tags on the record. Non-string entries are ignored.
    pub fn tags(&self) -> Vec<&str> {
        match self.0.get(TAGS_FIELD) {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Append a tag, keeping any tags already present.
    ///
    /// A non-array `_tags` value is replaced by an array holding the old
    /// value (if it was a string) and the new tag.
    pub fn add_tag(&mut self, tag: &str) {
        let mut tags = match self.0.remove(TAGS_FIELD) {
            Some(Value::Array(tags)) => tags,
            Some(Value::String(existing)) => vec![Value::String(existing)],
            _ => Vec::new(),
        };
        if !tags.iter().any(|t| t.as_str() == Some(tag)) {
            tags.push(Value::String(tag.to_string()));
        }
        self.0.insert(TAGS_FIELD.to_string(), Value::Array(tags));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }
}

impl From<Fields> for IndexRecord {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> IndexRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_object_id() {
        assert_eq!(record(json!({ "objectID": "a" })).object_id(), Some("a"));
        assert_eq!(record(json!({ "objectID": 1 })).object_id(), None);
        assert_eq!(record(json!({})).object_id(), None);
    }

    #[test]
    fn test_add_tag_creates_list() {
        let mut rec = record(json!({ "objectID": "a" }));
        rec.add_tag("doc-1");
        assert_eq!(rec.tags(), vec!["doc-1"]);
    }

    #[test]
    fn test_add_tag_keeps_existing_and_dedupes() {
        let mut rec = record(json!({ "_tags": ["featured", "doc-1"] }));
        rec.add_tag("doc-1");
        assert_eq!(rec.tags(), vec!["featured", "doc-1"]);

        let mut rec = record(json!({ "_tags": "featured" }));
        rec.add_tag("doc-1");
        assert_eq!(rec.tags(), vec!["featured", "doc-1"]);
    }
}
