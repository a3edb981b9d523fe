//! Live collection adapter
//!
//! The one synchronization pattern every screen repeats: open a
//! filtered, ordered live query scoped to the current user, mirror each
//! incoming snapshot into an in-memory ordered list, and write
//! create/delete mutations against the same collection. Implemented once
//! here and instantiated per record type.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::alerts::SharedAlerts;
use crate::auth::SessionHandle;
use crate::error::Error;
use crate::store::{CollectionQuery, DocumentStore, FieldFilter, Sort};

/// Lifecycle of one adapter instance. There is no Error state: a dropped
/// connection is the backend's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Unsubscribed,
    Subscribing,
    Live,
}

/// A record type mirrored by a [`LiveCollectionAdapter`]
pub trait LiveRecord: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backing collection name
    const COLLECTION: &'static str;

    /// Draft type written by [`LiveCollectionAdapter::create`]
    type Draft: DraftRecord;

    /// Sort key and direction for the mirrored list
    fn sort() -> Sort;
}

/// A new record before it is written: per-screen required-field policy
/// plus owner-id and timestamp stamping
pub trait DraftRecord: Send + 'static {
    /// Check required fields; the message is user-facing
    fn validate(&self) -> Result<(), Error>;

    /// Serialize into document fields with the owning user's id injected
    /// and the creation timestamp stamped
    fn into_fields(self, owner_id: &str, now: DateTime<Utc>) -> Value;
}

/// Mirrors one scoped collection into an ordered in-memory list
///
/// The store client and session handle are injected at construction so
/// tests can substitute an in-memory store. The adapter owns its
/// outstanding operations: snapshots or write results that complete
/// after [`unsubscribe`](Self::unsubscribe) (or after a re-subscription)
/// are discarded instead of mutating a detached list.
pub struct LiveCollectionAdapter<R: LiveRecord> {
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
    alerts: SharedAlerts,
    items: Arc<RwLock<Vec<R>>>,
    state: Arc<RwLock<AdapterState>>,
    // Bumped on every disposal; tasks and in-flight writes compare
    // against the epoch they started under.
    epoch: Arc<AtomicU64>,
    updates: watch::Sender<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: LiveRecord> LiveCollectionAdapter<R> {
    /// Create an adapter over the given store, session and alert sink
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle, alerts: SharedAlerts) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            store,
            session,
            alerts,
            items: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(RwLock::new(AdapterState::Unsubscribed)),
            epoch: Arc::new(AtomicU64::new(0)),
            updates,
            task: Mutex::new(None),
        }
    }

    /// The mirrored list, in the query's sort order
    pub fn items(&self) -> Vec<R> {
        self.items.read().unwrap().clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> AdapterState {
        *self.state.read().unwrap()
    }

    /// A receiver that changes whenever a snapshot has been applied.
    /// The view layer observes it to re-render.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    fn set_state(&self, value: AdapterState) {
        *self.state.write().unwrap() = value;
    }

    /// Open exactly one live query scoped to the current user plus the
    /// given counterpart filters, ordered by the record's sort key.
    /// An existing subscription is disposed first; changing the scope is
    /// a fresh subscription with a fresh disposer.
    pub async fn subscribe(&self, counterpart: Vec<FieldFilter>) -> Result<(), Error> {
        let identity = self
            .session
            .identity()
            .ok_or_else(|| Error::auth("No user is signed in"))?;

        self.dispose();
        self.set_state(AdapterState::Subscribing);
        let epoch = self.epoch.load(Ordering::SeqCst);

        let mut query = CollectionQuery::new(R::COLLECTION).eq("user_id", identity.id.as_str());
        query.filters.extend(counterpart);
        let query = query.order(R::sort());

        let mut live = match self.store.subscribe(&query).await {
            Ok(live) => live,
            Err(e) => {
                self.set_state(AdapterState::Unsubscribed);
                return Err(e);
            }
        };

        if self.epoch.load(Ordering::SeqCst) != epoch {
            // Disposed while the subscription was opening; dropping the
            // live query cancels it.
            return Ok(());
        }

        let items = self.items.clone();
        let state = self.state.clone();
        let epoch_cell = self.epoch.clone();
        let updates = self.updates.clone();
        let handle = tokio::spawn(async move {
            while let Some(batch) = live.next().await {
                if epoch_cell.load(Ordering::SeqCst) != epoch {
                    debug!("snapshot arrived after disposal, discarded");
                    break;
                }
                let mut list = Vec::with_capacity(batch.len());
                for doc in &batch {
                    match doc.deserialize::<R>() {
                        Ok(record) => list.push(record),
                        Err(e) => warn!(
                            "skipping malformed {} document {}: {}",
                            R::COLLECTION,
                            doc.id,
                            e
                        ),
                    }
                }
                // Full replace: only the latest observed state matters.
                *items.write().unwrap() = list;
                *state.write().unwrap() = AdapterState::Live;
                updates.send_modify(|v| *v += 1);
            }
        });
        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Stop receiving pushes. Must be invoked when the owning view is
    /// torn down; afterwards backend changes no longer touch the list.
    pub fn unsubscribe(&self) {
        self.dispose();
        self.set_state(AdapterState::Unsubscribed);
    }

    fn dispose(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().unwrap().take() {
            // Aborting the task drops the live query and its disposer.
            handle.abort();
        }
    }

    /// Validate and write one new document owned by the current user.
    ///
    /// No optimistic local insert: the list reflects the change on the
    /// next subscription push. Validation and write failures surface a
    /// user-facing alert; the list keeps its last-known-good value.
    pub async fn create(&self, draft: R::Draft) -> Result<(), Error> {
        if let Err(err) = draft.validate() {
            self.alerts.alert("Error", &err.to_string());
            return Err(err);
        }

        let identity = match self.session.identity() {
            Some(identity) => identity,
            None => {
                let err = Error::auth("No user is signed in");
                self.alerts.alert("Error", &err.to_string());
                return Err(err);
            }
        };

        let fields = draft.into_fields(&identity.id, Utc::now());
        let epoch = self.epoch.load(Ordering::SeqCst);
        match self.store.insert(R::COLLECTION, fields).await {
            Ok(_) => {
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    debug!(
                        "write to {} completed after disposal, result discarded",
                        R::COLLECTION
                    );
                }
                Ok(())
            }
            Err(err) => {
                if self.epoch.load(Ordering::SeqCst) == epoch {
                    self.alerts.alert("Error", &err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Delete the document with the given id. No optimistic local
    /// removal; the next push updates the list.
    pub async fn remove(&self, id: &str) -> Result<(), Error> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        match self.store.delete(R::COLLECTION, id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.epoch.load(Ordering::SeqCst) == epoch {
                    self.alerts.alert("Error", &err.to_string());
                }
                Err(err)
            }
        }
    }
}

impl<R: LiveRecord> Drop for LiveCollectionAdapter<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}
