//! Index routing.
//!
//! Maps document types to destination indices. Several types may share an
//! index; records are grouped by destination name so a shared index receives
//! one write per sync call rather than one per type.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::PipelineError;
use crate::processor::DocumentRecords;
use search_sync_repository::SearchIndex;
use search_sync_shared::IndexRecord;

/// Destination and field selection for one document type.
#[derive(Clone)]
pub struct TypeRoute {
    pub index: Arc<dyn SearchIndex>,
    /// Projection applied when fetching documents of this type; all fields
    /// when absent.
    pub projection: Option<String>,
}

impl TypeRoute {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            projection: None,
        }
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }
}

impl fmt::Debug for TypeRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRoute")
            .field("index", &self.index.name())
            .field("projection", &self.projection)
            .finish()
    }
}

/// Ordered mapping from document type to `TypeRoute`.
#[derive(Debug, Clone, Default)]
pub struct TypeRoutes {
    routes: Vec<(String, TypeRoute)>,
}

impl TypeRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, replacing any existing route for the same type.
    pub fn insert(&mut self, document_type: impl Into<String>, route: TypeRoute) {
        let document_type = document_type.into();
        match self.routes.iter_mut().find(|(t, _)| *t == document_type) {
            Some((_, existing)) => *existing = route,
            None => self.routes.push((document_type, route)),
        }
    }

    pub fn with_route(mut self, document_type: impl Into<String>, route: TypeRoute) -> Self {
        self.insert(document_type, route);
        self
    }

    pub fn get(&self, document_type: &str) -> Option<&TypeRoute> {
        self.routes
            .iter()
            .find(|(t, _)| t == document_type)
            .map(|(_, route)| route)
    }

    /// Configured types in insertion order.
    pub fn types(&self) -> Vec<&str> {
        self.routes.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeRoute)> {
        self.routes.iter().map(|(t, route)| (t.as_str(), route))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Records bound for one destination index.
pub struct Destination {
    pub index: Arc<dyn SearchIndex>,
    pub records: Vec<IndexRecord>,
}

impl Destination {
    pub fn name(&self) -> &str {
        self.index.name()
    }
}

/// Groups records by destination index.
#[derive(Debug, Clone)]
pub struct IndexRouter {
    routes: TypeRoutes,
}

impl IndexRouter {
    pub fn new(routes: TypeRoutes) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &TypeRoutes {
        &self.routes
    }

    /// The types a sync call operates on.
    ///
    /// Without a filter every configured type is active. A filter may only
    /// name configured types. With `replace_all`, a filter must not leave out
    /// a type that shares a destination with a selected type, since replacing
    /// that destination would drop the excluded type's records.
    pub fn select_types(
        &self,
        filter: Option<&[String]>,
        replace_all: bool,
    ) -> Result<Vec<String>, PipelineError> {
        let Some(filter) = filter else {
            return Ok(self.routes.types().into_iter().map(str::to_string).collect());
        };

        if let Some(unknown) = filter.iter().find(|t| self.routes.get(t).is_none()) {
            return Err(PipelineError::invalid_options(format!(
                "type filter names unrouted type {}",
                unknown
            )));
        }

        let selected: Vec<String> = self
            .routes
            .types()
            .into_iter()
            .filter(|t| filter.iter().any(|f| f == t))
            .map(str::to_string)
            .collect();
        if selected.is_empty() {
            return Err(PipelineError::invalid_options("type filter selects no types"));
        }

        if replace_all {
            let selected_indices = self.destination_names(&selected);
            for (document_type, route) in self.routes.iter() {
                let excluded = !selected.iter().any(|t| t == document_type);
                if excluded && selected_indices.iter().any(|name| name == route.index.name()) {
                    return Err(PipelineError::invalid_options(format!(
                        "replace-all on index {} would drop records of excluded type {}",
                        route.index.name(),
                        document_type
                    )));
                }
            }
        }

        Ok(selected)
    }

    /// Distinct destinations of `types`, in route order.
    pub fn destinations(&self, types: &[String]) -> Vec<Arc<dyn SearchIndex>> {
        let mut destinations: Vec<Arc<dyn SearchIndex>> = Vec::new();
        for (document_type, route) in self.routes.iter() {
            if !types.iter().any(|t| t == document_type) {
                continue;
            }
            if !destinations.iter().any(|d| d.name() == route.index.name()) {
                destinations.push(route.index.clone());
            }
        }
        destinations
    }

    fn destination_names(&self, types: &[String]) -> Vec<String> {
        self.destinations(types)
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Group built records by destination.
    ///
    /// Every destination of `types` is returned, even with no records, so
    /// deletes reach indices that received no writes. Records of a type
    /// outside `types` are dropped.
    pub fn route(&self, types: &[String], built: Vec<DocumentRecords>) -> Vec<Destination> {
        let mut destinations: Vec<Destination> = self
            .destinations(types)
            .into_iter()
            .map(|index| Destination {
                index,
                records: Vec::new(),
            })
            .collect();

        for document in built {
            let active = types.iter().any(|t| *t == document.document_type);
            let target = match self.routes.get(&document.document_type) {
                Some(route) if active => destinations
                    .iter_mut()
                    .find(|d| d.name() == route.index.name()),
                _ => None,
            };

            match target {
                Some(destination) => destination.records.extend(document.records),
                None => debug!(
                    document_id = %document.document_id,
                    document_type = %document.document_type,
                    "Skipping records of unrouted type"
                ),
            }
        }

        destinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_repository::MemorySearchIndex;
    use serde_json::json;

    fn record(id: &str) -> IndexRecord {
        serde_json::from_value(json!({ "objectID": id })).unwrap()
    }

    fn built(id: &str, document_type: &str) -> DocumentRecords {
        DocumentRecords {
            document_id: id.to_string(),
            document_type: document_type.to_string(),
            records: vec![record(id)],
        }
    }

    fn routes() -> TypeRoutes {
        let content: Arc<dyn SearchIndex> = Arc::new(MemorySearchIndex::new("content"));
        let people: Arc<dyn SearchIndex> = Arc::new(MemorySearchIndex::new("people"));
        TypeRoutes::new()
            .with_route("post", TypeRoute::new(content.clone()))
            .with_route("article", TypeRoute::new(content).with_projection("{ title }"))
            .with_route("author", TypeRoute::new(people))
    }

    fn filter(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    fn all_types(router: &IndexRouter) -> Vec<String> {
        router.select_types(None, false).unwrap()
    }

    #[test]
    fn test_shared_index_grouped() {
        let router = IndexRouter::new(routes());
        let types = all_types(&router);

        let destinations = router.route(
            &types,
            vec![built("p1", "post"), built("a1", "article"), built("x1", "unknown")],
        );

        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0].name(), "content");
        let ids: Vec<_> = destinations[0].records.iter().filter_map(|r| r.object_id()).collect();
        assert_eq!(ids, vec!["p1", "a1"]);
        assert_eq!(destinations[1].name(), "people");
        assert!(destinations[1].records.is_empty());
    }

    #[test]
    fn test_insert_replaces_route() {
        let mut routes = routes();
        routes.insert("post", TypeRoute::new(Arc::new(MemorySearchIndex::new("posts"))));

        assert_eq!(routes.len(), 3);
        assert_eq!(routes.types(), vec!["post", "article", "author"]);
        assert_eq!(routes.get("post").map(|r| r.index.name()), Some("posts"));
        assert_eq!(
            routes.get("article").and_then(|r| r.projection.as_deref()),
            Some("{ title }")
        );
    }

    #[test]
    fn test_type_filter() {
        let router = IndexRouter::new(routes());

        let selected = router
            .select_types(Some(filter(&["author"]).as_slice()), true)
            .unwrap();
        assert_eq!(selected, vec!["author".to_string()]);
        assert_eq!(router.destinations(&selected).len(), 1);

        let selected = router
            .select_types(Some(filter(&["post"]).as_slice()), false)
            .unwrap();
        assert_eq!(selected, vec!["post".to_string()]);
    }

    #[test]
    fn test_type_filter_rejections() {
        let router = IndexRouter::new(routes());

        let unknown = router.select_types(Some(filter(&["comment"]).as_slice()), false);
        assert!(matches!(unknown, Err(PipelineError::InvalidOptions(_))));

        let empty = router.select_types(Some(filter(&[]).as_slice()), false);
        assert!(matches!(empty, Err(PipelineError::InvalidOptions(_))));

        // `article` shares `content` with `post`.
        let partial = router.select_types(Some(filter(&["post"]).as_slice()), true);
        assert!(matches!(partial, Err(PipelineError::InvalidOptions(_))));
    }
}
