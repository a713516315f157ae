//! Document store abstraction.
//!
//! The [`DocumentStore`] trait is the only way the gateways reach
//! persistence. A deployment without a store simply holds no handle
//! (`Option<Arc<dyn DocumentStore>>` is `None`); nothing is probed through
//! globals or caught import failures.
//!
//! Implementations must be `Send + Sync`. The connection they wrap is the
//! only resource shared between concurrent requests and is synchronized by
//! the implementation itself.

pub mod memory;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// A schema-flexible record: a JSON object.
pub type Document = Map<String, Value>;

/// Equality filter. Every entry must match exactly.
pub type Filter = BTreeMap<String, String>;

/// Field under which stores expose their internal document identifier.
pub const INTERNAL_ID_FIELD: &str = "_id";

/// Abstract document store backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`name`](DocumentStore::name) | Configured store (database) name |
/// | [`ping`](DocumentStore::ping) | Cheap reachability check |
/// | [`insert`](DocumentStore::insert) | Persist one document, return its id |
/// | [`find`](DocumentStore::find) | Equality query bounded by a limit |
/// | [`list_collections`](DocumentStore::list_collections) | Existing collection names |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `true` when the store answers right now. Never fails.
    async fn ping(&self) -> bool;

    /// Persists `doc` into `collection` and returns an identifier unique
    /// within that collection.
    async fn insert(&self, collection: &str, doc: Document) -> Result<String>;

    /// Returns at most `limit` documents of `collection` matching every
    /// entry of `filter`. Returned documents carry their identifier under
    /// [`INTERNAL_ID_FIELD`].
    async fn find(&self, collection: &str, filter: &Filter, limit: usize)
        -> Result<Vec<Document>>;

    async fn list_collections(&self) -> Result<Vec<String>>;
}

/// Serializes a model into a [`Document`].
pub fn to_document<T: Serialize>(value: &T) -> serde_json::Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Checks whether `doc` satisfies every entry of `filter`.
///
/// Only string fields can match; a missing field never matches.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key).and_then(Value::as_str) == Some(expected.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches_filter(&doc(json!({"code": "X"})), &Filter::new()));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let mut filter = Filter::new();
        filter.insert("type".into(), "IC".into());
        assert!(!matches_filter(&doc(json!({"code": "X"})), &filter));
        assert!(matches_filter(&doc(json!({"code": "X", "type": "IC"})), &filter));
        assert!(!matches_filter(&doc(json!({"code": "X", "type": ""})), &filter));
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(to_document(&vec![1, 2]).is_err());
        assert!(to_document(&json!({"a": 1})).is_ok());
    }
}
