//! Wire messages for the live query protocol

use serde::{Deserialize, Serialize};

/// A full message received or sent over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveMessage {
    pub topic: String,
    pub event: LiveEvent,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub message_ref: serde_json::Value,
}

/// Live protocol events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveEvent {
    /// Open a live query for a topic
    Sub,
    /// Close a live query
    Unsub,
    /// Full result set push for a topic
    Snapshot,
    /// Connection keep-alive
    Heartbeat,
    /// Server-side error for a topic
    Error,
    /// Server closed the topic
    Close,
}
