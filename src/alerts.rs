//! User-facing alerts
//!
//! Every error path, and a few success paths, surface a blocking alert.
//! This is the only user-visible error channel; there are no toast or
//! log-only paths. The embedding application supplies an [`AlertSink`]
//! that presents a modal; the default sink routes to the log.

use log::warn;
use std::sync::Arc;

/// Receiver for user-facing alert messages
pub trait AlertSink: Send + Sync {
    /// Present a blocking alert with the given title and message
    fn alert(&self, title: &str, message: &str);
}

/// Shared handle to an alert sink
pub type SharedAlerts = Arc<dyn AlertSink>;

/// Default sink used when the embedder does not provide one
pub struct LogAlerts;

impl AlertSink for LogAlerts {
    fn alert(&self, title: &str, message: &str) {
        warn!("alert: {}: {}", title, message);
    }
}
