//! OpenSearch request body builders.
//!
//! Bulk bodies are built as newline-delimited action/source pairs and the
//! delete queries as plain JSON values, so both can be checked without a
//! running cluster.

use opensearch::http::request::JsonBody;
use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use search_sync_shared::IndexRecord;

/// Build the bulk body indexing every record under its `objectID`.
///
/// Fails if any record lacks a string `objectID`, before anything is sent.
pub fn build_bulk_index_body(
    records: &[IndexRecord],
) -> Result<Vec<JsonBody<Value>>, SearchIndexError> {
    let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(records.len() * 2);

    for record in records {
        let object_id = record.object_id().ok_or_else(|| {
            SearchIndexError::validation("record is missing a string objectID")
        })?;
        body.push(json!({ "index": { "_id": object_id } }).into());
        body.push(Value::Object(record.fields().clone()).into());
    }

    Ok(body)
}

/// Build the bulk body deleting each id.
pub fn build_bulk_delete_body(object_ids: &[String]) -> Vec<JsonBody<Value>> {
    object_ids
        .iter()
        .map(|id| json!({ "delete": { "_id": id } }).into())
        .collect()
}

/// Query matching every record tagged with any of `tags`.
pub fn build_tag_query(tag_field: &str, tags: &[String]) -> Value {
    json!({
        "query": {
            "terms": {
                tag_field: tags
            }
        }
    })
}

/// Query matching every record whose id is not in `keep_ids`.
pub fn build_stale_records_query(keep_ids: &[&str]) -> Value {
    json!({
        "query": {
            "bool": {
                "must_not": {
                    "ids": { "values": keep_ids }
                }
            }
        }
    })
}

/// Collect item-level failures from a bulk response.
///
/// Delete actions answering 404 are not failures: the record was already gone.
pub fn bulk_failures(response: &Value) -> Vec<String> {
    if response.get("errors").and_then(Value::as_bool) != Some(true) {
        return Vec::new();
    }

    let empty = Vec::new();
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    items
        .iter()
        .filter_map(|item| item.as_object()?.iter().next())
        .filter(|(action, result)| {
            let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
            let not_found = action.as_str() == "delete" && status == 404;
            result.get("error").is_some() && !not_found
        })
        .map(|(action, result)| {
            let id = result.get("_id").and_then(Value::as_str).unwrap_or("?");
            let reason = result
                .get("error")
                .and_then(|e| e.get("reason"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            format!("{} {}: {}", action, id, reason)
        })
        .collect()
}
