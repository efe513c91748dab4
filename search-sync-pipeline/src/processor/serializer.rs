//! Caller-supplied document serialization.

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use search_sync_shared::{Fields, SourceDocument};

/// Error type returned by serializers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// The output of serializing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Serialized {
    /// One record for the document.
    Single(Fields),
    /// Several records for the document, each carrying its own `objectID`.
    Expanded(Vec<Fields>),
}

impl Serialized {
    /// Read an object as `Single` or an array of objects as `Expanded`.
    pub fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Object(fields) => Ok(Serialized::Single(fields)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(fields) => Ok(fields),
                    other => Err(format!("expanded record is not an object: {}", other).into()),
                })
                .collect::<Result<Vec<_>, BoxError>>()
                .map(Serialized::Expanded),
            other => Err(format!("serializer output is not an object or array: {}", other).into()),
        }
    }
}

impl From<Fields> for Serialized {
    fn from(fields: Fields) -> Self {
        Serialized::Single(fields)
    }
}

impl From<Vec<Fields>> for Serialized {
    fn from(records: Vec<Fields>) -> Self {
        Serialized::Expanded(records)
    }
}

/// Turns a source document into record fields.
#[async_trait]
pub trait DocumentSerializer: Send + Sync {
    async fn serialize(&self, document: &SourceDocument) -> Result<Serialized, BoxError>;
}

/// Serializer backed by a synchronous closure. See [`serializer_fn`].
pub struct FnSerializer<F>(F);

/// Wrap a synchronous closure as a `DocumentSerializer`.
///
/// ```ignore
/// let serializer = serializer_fn(|doc: &SourceDocument| {
///     Serialized::from_value(json!({ "title": doc.get("title") }))
/// });
/// ```
pub fn serializer_fn<F>(f: F) -> FnSerializer<F>
where
    F: Fn(&SourceDocument) -> Result<Serialized, BoxError> + Send + Sync,
{
    FnSerializer(f)
}

#[async_trait]
impl<F> DocumentSerializer for FnSerializer<F>
where
    F: Fn(&SourceDocument) -> Result<Serialized, BoxError> + Send + Sync,
{
    async fn serialize(&self, document: &SourceDocument) -> Result<Serialized, BoxError> {
        (self.0)(document)
    }
}

/// Serializer backed by an async closure. See [`async_serializer_fn`].
pub struct AsyncFnSerializer<F>(F);

/// Wrap an async closure as a `DocumentSerializer`.
///
/// The closure receives its own copy of the document so the returned future
/// does not borrow from the caller.
pub fn async_serializer_fn<F, Fut>(f: F) -> AsyncFnSerializer<F>
where
    F: Fn(SourceDocument) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Serialized, BoxError>> + Send + 'static,
{
    AsyncFnSerializer(f)
}

#[async_trait]
impl<F, Fut> DocumentSerializer for AsyncFnSerializer<F>
where
    F: Fn(SourceDocument) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Serialized, BoxError>> + Send + 'static,
{
    async fn serialize(&self, document: &SourceDocument) -> Result<Serialized, BoxError> {
        (self.0)(document.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> SourceDocument {
        SourceDocument::try_from(json!({ "_id": "a", "_type": "post", "title": "Hello" })).unwrap()
    }

    #[test]
    fn test_from_value() {
        assert!(matches!(
            Serialized::from_value(json!({ "title": "x" })).unwrap(),
            Serialized::Single(_)
        ));

        match Serialized::from_value(json!([{ "objectID": "1" }, { "objectID": "2" }])).unwrap() {
            Serialized::Expanded(records) => assert_eq!(records.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        assert!(Serialized::from_value(json!("text")).is_err());
        assert!(Serialized::from_value(json!([{ "objectID": "1" }, 3])).is_err());
    }

    #[tokio::test]
    async fn test_sync_closure() {
        let serializer = serializer_fn(|doc: &SourceDocument| {
            Serialized::from_value(json!({ "title": doc.get("title") }))
        });

        let result = serializer.serialize(&doc()).await.unwrap();
        assert_eq!(
            result,
            Serialized::from_value(json!({ "title": "Hello" })).unwrap()
        );
    }

    #[tokio::test]
    async fn test_async_closure() {
        let serializer = async_serializer_fn(|doc: SourceDocument| async move {
            tokio::task::yield_now().await;
            Serialized::from_value(json!({ "upper": doc.id().to_uppercase() }))
        });

        let result = serializer.serialize(&doc()).await.unwrap();
        assert_eq!(
            result,
            Serialized::from_value(json!({ "upper": "A" })).unwrap()
        );
    }
}
