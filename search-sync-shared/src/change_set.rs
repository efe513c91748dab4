//! Change sets delivered by webhook notifications.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayloadError;

/// Document ids affected by a mutation, partitioned by kind of change.
///
/// Every list defaults to empty when absent from the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub created: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// Build a change set from id lists.
    pub fn from_ids<S: Into<String>>(
        created: impl IntoIterator<Item = S>,
        updated: impl IntoIterator<Item = S>,
        deleted: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            created: created.into_iter().map(Into::into).collect(),
            updated: updated.into_iter().map(Into::into).collect(),
            deleted: deleted.into_iter().map(Into::into).collect(),
        }
    }

    /// Treat every id as newly created.
    pub fn created(ids: Vec<String>) -> Self {
        Self {
            created: ids,
            ..Default::default()
        }
    }

    /// Created then updated ids, keeping the first occurrence of each.
    pub fn touched(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.created
            .iter()
            .chain(self.updated.iter())
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// The `{ "ids": { ... } }` delivery shape.
#[derive(Debug, Deserialize)]
struct IdsPayload {
    ids: ChangeSet,
}

/// The single-document delivery shape, as sent by projection webhooks.
#[derive(Debug, Deserialize)]
struct OperationPayload {
    #[serde(rename = "_id")]
    id: String,
    operation: String,
}

/// Webhook body parsing.
///
/// Two body shapes are accepted: the id-list shape
/// `{ "ids": { "created": [..], "updated": [..], "deleted": [..] } }` and the
/// single-document shape `{ "_id": "..", "operation": "create|update|delete" }`.
pub struct WebhookPayload;

impl WebhookPayload {
    /// Parse a raw webhook body into a change set.
    pub fn parse(body: &[u8]) -> Result<ChangeSet, PayloadError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| PayloadError::malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Read an already-decoded webhook body.
    pub fn from_value(value: Value) -> Result<ChangeSet, PayloadError> {
        let Value::Object(ref object) = value else {
            return Err(PayloadError::malformed("payload is not a JSON object"));
        };

        if object.contains_key("ids") {
            let payload: IdsPayload = serde_json::from_value(value)
                .map_err(|e| PayloadError::malformed(format!("invalid ids: {}", e)))?;
            return Ok(payload.ids);
        }

        if object.contains_key("_id") && object.contains_key("operation") {
            let payload: OperationPayload = serde_json::from_value(value)
                .map_err(|e| PayloadError::malformed(e.to_string()))?;
            let ids = vec![payload.id];
            return match payload.operation.as_str() {
                "create" => Ok(ChangeSet {
                    created: ids,
                    ..Default::default()
                }),
                "update" => Ok(ChangeSet {
                    updated: ids,
                    ..Default::default()
                }),
                "delete" => Ok(ChangeSet {
                    deleted: ids,
                    ..Default::default()
                }),
                other => Err(PayloadError::UnknownOperation(other.to_string())),
            };
        }

        Err(PayloadError::malformed(
            "expected an `ids` object or `_id` and `operation` fields",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ids_payload() {
        let body = br#"{"ids":{"created":["a"],"updated":["b"],"deleted":["c"]}}"#;
        let change_set = WebhookPayload::parse(body).unwrap();

        assert_eq!(change_set, ChangeSet::from_ids(["a"], ["b"], ["c"]));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let change_set = WebhookPayload::parse(br#"{"ids":{"deleted":["c"]}}"#).unwrap();

        assert!(change_set.created.is_empty());
        assert!(change_set.updated.is_empty());
        assert_eq!(change_set.deleted, vec!["c".to_string()]);
    }

    #[test]
    fn test_missing_ids_rejected() {
        let result = WebhookPayload::parse(br#"{"created":["a"]}"#);
        assert!(matches!(result, Err(PayloadError::Malformed(_))));
    }

    #[test]
    fn test_non_string_ids_rejected() {
        let result = WebhookPayload::from_value(json!({ "ids": { "created": [1, 2] } }));
        assert!(matches!(result, Err(PayloadError::Malformed(_))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(WebhookPayload::parse(b"not json").is_err());
        assert!(WebhookPayload::parse(b"[]").is_err());
    }

    #[test]
    fn test_operation_payload() {
        let created = WebhookPayload::from_value(json!({
            "_id": "post-1",
            "operation": "create",
            "value": { "title": "ignored" }
        }))
        .unwrap();
        assert_eq!(created.created, vec!["post-1".to_string()]);

        let deleted =
            WebhookPayload::from_value(json!({ "_id": "post-1", "operation": "delete" })).unwrap();
        assert_eq!(deleted.deleted, vec!["post-1".to_string()]);

        let unknown = WebhookPayload::from_value(json!({ "_id": "post-1", "operation": "move" }));
        assert_eq!(
            unknown.unwrap_err(),
            PayloadError::UnknownOperation("move".to_string())
        );
    }

    #[test]
    fn test_touched_keeps_order_and_dedupes() {
        let change_set = ChangeSet::from_ids(["a", "b"], ["b", "c", "a"], ["d"]);
        assert_eq!(change_set.touched(), vec!["a", "b", "c"]);
    }
}
