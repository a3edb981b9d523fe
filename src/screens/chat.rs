//! Chat screen
//!
//! One conversation per (doctor, patient) pair, oldest message first.
//! Blank input is silently ignored rather than alerted.

use std::sync::Arc;
use tokio::sync::watch;

use crate::alerts::SharedAlerts;
use crate::auth::SessionHandle;
use crate::error::Error;
use crate::live::{AdapterState, LiveCollectionAdapter};
use crate::models::{ChatMessage, NewChatMessage};
use crate::store::{DocumentStore, FieldFilter};

/// Controller for the chat screen
pub struct ChatScreen {
    adapter: LiveCollectionAdapter<ChatMessage>,
    doctor_id: String,

    /// Message input field
    pub draft: String,
}

impl ChatScreen {
    /// Create the screen for one conversation
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: SessionHandle,
        alerts: SharedAlerts,
        doctor_id: &str,
    ) -> Self {
        Self {
            adapter: LiveCollectionAdapter::new(store, session, alerts),
            doctor_id: doctor_id.to_string(),
            draft: String::new(),
        }
    }

    /// Subscribe to the conversation
    pub async fn open(&self) -> Result<(), Error> {
        self.adapter
            .subscribe(vec![FieldFilter::new("doctor_id", self.doctor_id.as_str())])
            .await
    }

    /// Send the drafted message. A blank draft is a no-op; on success
    /// the input is cleared and the message appears on the next push.
    pub async fn send(&mut self) -> Result<(), Error> {
        if self.draft.trim().is_empty() {
            return Ok(());
        }

        let draft = NewChatMessage {
            doctor_id: self.doctor_id.clone(),
            message: self.draft.clone(),
        };
        self.adapter.create(draft).await?;
        self.draft.clear();
        Ok(())
    }

    /// The conversation, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.adapter.items()
    }

    /// Whether a message was sent by the given user (styled as "mine")
    pub fn is_own_message(message: &ChatMessage, user_id: &str) -> bool {
        message.user_id == user_id
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
