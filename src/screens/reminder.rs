//! Reminder ("rappel") screen
//!
//! Same shape as the prescription screen over its own collection;
//! the description is optional here.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

use crate::alerts::SharedAlerts;
use crate::auth::SessionHandle;
use crate::error::Error;
use crate::live::{AdapterState, LiveCollectionAdapter};
use crate::models::{NewReminder, Reminder};
use crate::store::DocumentStore;

/// Controller for the reminder screen
pub struct ReminderScreen {
    adapter: LiveCollectionAdapter<Reminder>,

    /// Title form field
    pub title: String,
    /// Description form field, may stay blank
    pub description: String,
    /// Selected start date
    pub start_date: Option<DateTime<Utc>>,
    /// Selected end date
    pub end_date: Option<DateTime<Utc>>,
}

impl ReminderScreen {
    /// Create the screen
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle, alerts: SharedAlerts) -> Self {
        Self {
            adapter: LiveCollectionAdapter::new(store, session, alerts),
            title: String::new(),
            description: String::new(),
            start_date: None,
            end_date: None,
        }
    }

    /// Subscribe to the owner-scoped reminder list
    pub async fn open(&self) -> Result<(), Error> {
        self.adapter.subscribe(Vec::new()).await
    }

    /// Add a reminder from the current form fields; clears the form on
    /// success
    pub async fn submit(&mut self) -> Result<(), Error> {
        let draft = NewReminder {
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        };
        self.adapter.create(draft).await?;

        self.title.clear();
        self.description.clear();
        self.start_date = None;
        self.end_date = None;
        Ok(())
    }

    /// Delete one reminder by id
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.adapter.remove(id).await
    }

    /// The mirrored reminder list, earliest start date first
    pub fn reminders(&self) -> Vec<Reminder> {
        self.adapter.items()
    }

    /// Adapter lifecycle state
    pub fn state(&self) -> AdapterState {
        self.adapter.state()
    }

    /// Signal that changes when a push has been applied
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.adapter.updates()
    }

    /// Tear the screen down
    pub fn close(&self) {
        self.adapter.unsubscribe();
    }
}
