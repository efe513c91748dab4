//! Document store query construction.
//!
//! Queries are parameterized; ids and types are never spliced into the text.
//! Parameters used:
//!
//! * `$created`, `$updated`: id lists of the change set
//! * `$types`: the active document types

use crate::router::TypeRoutes;

/// Lists the ids of every published document of `$types`.
pub const LIST_IDS_QUERY: &str = r#"*[_type in $types && !(_id in path("drafts.**"))]._id"#;

const FETCH_FILTER: &str = "*[(_id in $created + $updated) && _type in $types]";

/// Query fetching the created and updated documents of the active types.
///
/// Every document keeps its system fields; the rest is selected by the
/// projection of its type's route, or all fields when the route has none.
pub fn build_fetch_query(routes: &TypeRoutes, types: &[String]) -> String {
    let mut members = vec!["_id".to_string(), "_type".to_string(), "_rev".to_string()];

    for (document_type, route) in routes.iter() {
        if !types.iter().any(|t| t == document_type) {
            continue;
        }
        let projection = route
            .projection
            .as_deref()
            .map(normalize_projection)
            .unwrap_or_else(|| "{...}".to_string());
        members.push(format!(
            "_type == \"{}\" => {}",
            escape(document_type),
            projection
        ));
    }

    format!("{}{{ {} }}", FETCH_FILTER, members.join(", "))
}

/// Wrap a bare field list in braces.
fn normalize_projection(projection: &str) -> String {
    let trimmed = projection.trim();
    if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        format!("{{ {} }}", trimmed)
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::TypeRoute;
    use search_sync_repository::{MemorySearchIndex, SearchIndex};
    use std::sync::Arc;

    fn routes() -> TypeRoutes {
        let content: Arc<dyn SearchIndex> = Arc::new(MemorySearchIndex::new("content"));
        TypeRoutes::new()
            .with_route("post", TypeRoute::new(content.clone()))
            .with_route("article", TypeRoute::new(content.clone()).with_projection("title, body"))
            .with_route("author", TypeRoute::new(content).with_projection("{ name }"))
    }

    #[test]
    fn test_fetch_query() {
        let types = vec!["post".to_string(), "article".to_string(), "author".to_string()];
        assert_eq!(
            build_fetch_query(&routes(), &types),
            "*[(_id in $created + $updated) && _type in $types]{ _id, _type, _rev, \
             _type == \"post\" => {...}, \
             _type == \"article\" => { title, body }, \
             _type == \"author\" => { name } }"
        );
    }

    #[test]
    fn test_fetch_query_only_active_types() {
        let query = build_fetch_query(&routes(), &["author".to_string()]);
        assert!(query.contains("\"author\""));
        assert!(!query.contains("\"post\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a"b"#), r#"a\"b"#);
    }
}
