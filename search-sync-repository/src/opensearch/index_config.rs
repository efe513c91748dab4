//! OpenSearch index configuration and mappings.
//!
//! Records are free-form, so only the identity and tag fields get explicit
//! mappings; everything else is mapped dynamically on first write.

use serde_json::{json, Value};

/// Get the index settings and mappings for a sync destination index.
///
/// `objectID`, `type`, `rev` and the tag field are keyword fields so they can
/// be matched exactly by the delete queries.
pub fn get_index_settings(tag_field: &str) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "objectID": {
                    "type": "keyword"
                },
                "type": {
                    "type": "keyword"
                },
                "rev": {
                    "type": "keyword"
                },
                tag_field: {
                    "type": "keyword"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings("_tags");

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["objectID"]["type"], "keyword");
        assert_eq!(properties["type"]["type"], "keyword");
        assert_eq!(properties["_tags"]["type"], "keyword");
    }

    #[test]
    fn test_custom_tag_field() {
        let settings = get_index_settings("source_ids");
        assert_eq!(
            settings["mappings"]["properties"]["source_ids"]["type"],
            "keyword"
        );
    }
}
