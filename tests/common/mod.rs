#![allow(dead_code)]

//! Shared test harness: an in-memory document store with working live
//! queries, a recording alert sink and a signed-in session fixture.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use medilink_rust::alerts::AlertSink;
use medilink_rust::auth::{AuthUser, Session, SessionHandle};
use medilink_rust::error::Error;
use medilink_rust::store::{CollectionQuery, Document, DocumentStore, LiveQuery, SortDirection};

struct Subscription {
    id: u64,
    query: CollectionQuery,
    sender: mpsc::Sender<Vec<Document>>,
}

struct Inner {
    collections: HashMap<String, Vec<Document>>,
    subs: Vec<Subscription>,
    next_doc: u64,
    next_sub: u64,
}

/// In-memory [`DocumentStore`] with the same contract as the backend:
/// every change re-sends the full filtered, sorted result set to each
/// open subscription on the touched collection.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                collections: HashMap::new(),
                subs: Vec::new(),
                next_doc: 0,
                next_sub: 0,
            })),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make subsequent inserts and deletes fail with a store error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a document without notifying subscribers; returns its id
    pub fn seed(&self, collection: &str, fields: Value) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_doc += 1;
        let id = format!("doc-{}", inner.next_doc);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        id
    }

    /// Replace a document's fields and push the change to subscribers,
    /// standing in for a server-side edit (e.g. a doctor confirming an
    /// appointment)
    pub fn update(&self, collection: &str, id: &str, fields: Value) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(docs) = inner.collections.get_mut(collection) {
            if let Some(doc) = docs.iter_mut().find(|d| d.id == id) {
                doc.fields = fields;
            }
        }
        Self::notify(&inner, collection);
    }

    /// Raw contents of a collection, in insertion order
    pub fn docs(&self, collection: &str) -> Vec<Document> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of open subscriptions
    pub fn open_subscriptions(&self) -> usize {
        self.inner.lock().unwrap().subs.len()
    }

    fn matches(query: &CollectionQuery, doc: &Document) -> bool {
        query
            .filters
            .iter()
            .all(|f| doc.fields.get(&f.field) == Some(&f.value))
    }

    fn sort_value(doc: &Document, key: &str) -> String {
        match doc.fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn result_for(inner: &Inner, query: &CollectionQuery) -> Vec<Document> {
        let mut result: Vec<Document> = inner
            .collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| Self::matches(query, doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(sort) = &query.sort {
            result.sort_by_key(|doc| Self::sort_value(doc, &sort.key));
            if sort.direction == SortDirection::Descending {
                result.reverse();
            }
        }
        result
    }

    fn notify(inner: &Inner, collection: &str) {
        for sub in &inner.subs {
            if sub.query.collection == collection {
                let result = Self::result_for(inner, &sub.query);
                // A full receiver means the reader lags; the next
                // notification carries the complete state anyway.
                let _ = sub.sender.try_send(result);
            }
        }
    }
}

struct SubGuard {
    id: u64,
    inner: Arc<Mutex<Inner>>,
}

impl Drop for SubGuard {
    fn drop(&mut self) {
        self.inner.lock().unwrap().subs.retain(|s| s.id != self.id);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Document>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::result_for(&inner, query))
    }

    async fn insert(&self, collection: &str, fields: Value) -> Result<Document, Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("insert rejected"));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.next_doc += 1;
        let doc = Document {
            id: format!("doc-{}", inner.next_doc),
            fields,
        };
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Self::notify(&inner, collection);
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("delete rejected"));
        }
        let mut inner = self.inner.lock().unwrap();
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Self::notify(&inner, collection);
        Ok(())
    }

    async fn subscribe(&self, query: &CollectionQuery) -> Result<LiveQuery, Error> {
        let (sender, receiver) = mpsc::channel(16);
        let mut inner = self.inner.lock().unwrap();
        inner.next_sub += 1;
        let id = inner.next_sub;

        let initial = Self::result_for(&inner, query);
        let _ = sender.try_send(initial);

        inner.subs.push(Subscription {
            id,
            query: query.clone(),
            sender,
        });
        let guard = SubGuard {
            id,
            inner: self.inner.clone(),
        };
        Ok(LiveQuery::new(receiver, Box::new(guard)))
    }
}

/// Alert sink that records every (title, message) pair
#[derive(Default)]
pub struct RecordingAlerts {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, title: &str, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// A session handle signed in as the given user id
pub fn test_session(user_id: &str) -> SessionHandle {
    let session = SessionHandle::new();
    session.set(Session {
        access_token: format!("token-{}", user_id),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        refresh_token: "refresh".to_string(),
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
            phone: None,
            created_at: None,
            last_sign_in_at: None,
        },
    });
    session
}

/// Wait (bounded) until the predicate holds, re-checking after every
/// update signal
pub async fn wait_for<F: Fn() -> bool>(updates: &mut watch::Receiver<u64>, predicate: F) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if predicate() {
                return;
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for condition");
    assert!(predicate(), "condition not met");
}
