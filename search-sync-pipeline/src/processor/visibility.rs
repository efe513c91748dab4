//! Per-document visibility predicates.

use serde_json::Value;

use search_sync_shared::SourceDocument;

/// Decides whether a document belongs in the index at all.
pub trait VisibilityFilter: Send + Sync {
    fn is_visible(&self, document: &SourceDocument) -> bool;
}

/// Every document is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl VisibilityFilter for AlwaysVisible {
    fn is_visible(&self, _document: &SourceDocument) -> bool {
        true
    }
}

/// Visible unless the named field holds a truthy value.
///
/// `null`, `false`, `0`, `""` and an absent field count as not hidden;
/// any other value (non-empty strings, non-zero numbers, arrays, objects)
/// hides the document.
#[derive(Debug, Clone)]
pub struct HiddenFlag {
    field: String,
}

impl HiddenFlag {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl VisibilityFilter for HiddenFlag {
    fn is_visible(&self, document: &SourceDocument) -> bool {
        !document.get(&self.field).is_some_and(is_truthy)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Filter backed by a closure. See [`visibility_fn`].
pub struct FnVisibility<F>(F);

pub fn visibility_fn<F>(f: F) -> FnVisibility<F>
where
    F: Fn(&SourceDocument) -> bool + Send + Sync,
{
    FnVisibility(f)
}

impl<F> VisibilityFilter for FnVisibility<F>
where
    F: Fn(&SourceDocument) -> bool + Send + Sync,
{
    fn is_visible(&self, document: &SourceDocument) -> bool {
        (self.0)(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> SourceDocument {
        SourceDocument::try_from(value).unwrap()
    }

    fn flagged(value: Value) -> SourceDocument {
        doc(json!({ "_id": "a", "_type": "post", "isHidden": value }))
    }

    #[test]
    fn test_hidden_flag() {
        let filter = HiddenFlag::new("isHidden");

        assert!(filter.is_visible(&doc(json!({ "_id": "a", "_type": "post" }))));
        assert!(filter.is_visible(&flagged(json!(false))));
        assert!(!filter.is_visible(&flagged(json!(true))));
    }

    #[test]
    fn test_hidden_flag_truthy_values() {
        let filter = HiddenFlag::new("isHidden");

        for hidden in [json!("yes"), json!(1), json!(-0.5), json!({ "a": 1 }), json!([])] {
            assert!(!filter.is_visible(&flagged(hidden.clone())), "{} should hide", hidden);
        }
        for shown in [json!(null), json!(0), json!(0.0), json!(""), json!(false)] {
            assert!(filter.is_visible(&flagged(shown.clone())), "{} should show", shown);
        }
    }

    #[test]
    fn test_closure_filter() {
        let filter = visibility_fn(|d: &SourceDocument| d.get("published") == Some(&json!(true)));

        assert!(filter.is_visible(&doc(json!({ "_id": "a", "_type": "post", "published": true }))));
        assert!(!filter.is_visible(&doc(json!({ "_id": "a", "_type": "post" }))));
        assert!(AlwaysVisible.is_visible(&doc(json!({ "_id": "a", "_type": "post" }))));
    }
}
