//! Document store access for the MediLink backend
//!
//! Collections hold documents keyed by server-issued opaque ids. Queries
//! are equality filters on named fields combined with at most one
//! ascending/descending sort key, delivered either as a one-shot read or
//! as a live push stream that re-sends the full result set on every
//! change.

mod rest;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;
use tokio::sync::mpsc;

use crate::error::Error;

pub use rest::StoreClient;

/// A stored document: the server-issued id plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Server-issued opaque id
    pub id: String,
    /// The document body as a JSON object
    pub fields: Value,
}

impl Document {
    /// Build a document from a JSON object carrying an `id` member,
    /// splitting the id out of the remaining fields.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(Error::store(format!(
                    "expected a document object, got {}",
                    other
                )))
            }
        };
        let id = match object.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(Error::store("document is missing an id")),
        };
        Ok(Self {
            id,
            fields: Value::Object(object),
        })
    }

    /// Deserialize into a typed record, flattening the id into the
    /// record as `{id, ...fields}`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let mut object = match &self.fields {
            Value::Object(object) => object.clone(),
            other => Map::from_iter([("fields".to_string(), other.clone())]),
        };
        object.insert("id".to_string(), Value::String(self.id.clone()));
        let record = serde_json::from_value(Value::Object(object))?;
        Ok(record)
    }
}

/// Equality filter on a named field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// Filter documents whose field equals the given value
    pub fn new<V: Into<Value>>(field: &str, value: V) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Sort direction for the single sort key of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Single sort key plus direction
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// A collection query: equality filters plus an optional sort key
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub sort: Option<Sort>,
}

impl CollectionQuery {
    /// Create a query over the named collection
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filters: Vec::new(),
            sort: None,
        }
    }

    /// Add an equality filter
    pub fn eq<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set the sort key
    pub fn order(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Wire representation used by the live subscription protocol
    pub(crate) fn to_payload(&self) -> Value {
        let filters: Vec<Value> = self
            .filters
            .iter()
            .map(|f| serde_json::json!({ "field": f.field, "value": f.value }))
            .collect();
        let mut payload = serde_json::json!({
            "collection": self.collection,
            "filters": filters,
        });
        if let Some(sort) = &self.sort {
            payload["order"] = serde_json::json!({
                "key": sort.key,
                "direction": sort.direction.as_str(),
            });
        }
        payload
    }
}

/// An open live query. Every received batch is the full current result
/// set for the query. Dropping the value cancels the subscription.
pub struct LiveQuery {
    snapshots: mpsc::Receiver<Vec<Document>>,
    _guard: Box<dyn Any + Send>,
}

impl LiveQuery {
    /// Assemble a live query from a snapshot receiver and a disposer
    /// whose drop cancels the underlying subscription.
    pub fn new(snapshots: mpsc::Receiver<Vec<Document>>, guard: Box<dyn Any + Send>) -> Self {
        Self {
            snapshots,
            _guard: guard,
        }
    }

    /// Wait for the next snapshot; `None` once the subscription is gone
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.snapshots.recv().await
    }
}

/// Backend document store operations
///
/// The production implementation is [`StoreClient`]; tests substitute an
/// in-memory store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot read of all documents matching the query
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Document>, Error>;

    /// Write one new document; the server assigns the id and returns the
    /// stored representation
    async fn insert(&self, collection: &str, fields: Value) -> Result<Document, Error>;

    /// Delete the document with the given id
    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error>;

    /// Open a live query. The initial snapshot and every subsequent
    /// change arrive as full result sets on the returned stream.
    async fn subscribe(&self, query: &CollectionQuery) -> Result<LiveQuery, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_from_value_splits_id() {
        let doc = Document::from_value(json!({
            "id": "doc-1",
            "title": "Paracetamol",
        }))
        .unwrap();
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.fields, json!({ "title": "Paracetamol" }));
    }

    #[test]
    fn document_from_value_requires_id() {
        let err = Document::from_value(json!({ "title": "Paracetamol" }));
        assert!(err.is_err());
    }

    #[test]
    fn live_query_yields_snapshots_until_the_sender_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        let mut live = LiveQuery::new(rx, Box::new(()));

        tx.try_send(vec![Document {
            id: "r1".to_string(),
            fields: json!({ "title": "Vitamine D" }),
        }])
        .unwrap();
        let batch = tokio_test::block_on(live.next()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, "r1");

        drop(tx);
        assert!(tokio_test::block_on(live.next()).is_none());
    }

    #[test]
    fn query_payload_carries_filters_and_order() {
        let query = CollectionQuery::new("messages")
            .eq("doctor_id", "d1")
            .eq("user_id", "u1")
            .order(Sort::ascending("sent_at"));
        let payload = query.to_payload();
        assert_eq!(payload["collection"], "messages");
        assert_eq!(payload["filters"].as_array().unwrap().len(), 2);
        assert_eq!(payload["order"]["key"], "sent_at");
        assert_eq!(payload["order"]["direction"], "asc");
    }
}
