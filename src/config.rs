//! Configuration options for the MediLink client

use std::time::Duration;

/// Configuration options for the MediLink client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout for one-shot reads and writes
    pub request_timeout: Option<Duration>,

    /// Interval between live connection heartbeats, in milliseconds
    pub heartbeat_interval: u64,

    /// Buffered snapshots per live query before the oldest is dropped.
    /// Every snapshot carries the full result set, so only the latest
    /// observed state matters.
    pub live_channel_capacity: usize,

    /// How long to wait for the live connection to come up before a
    /// subscription attempt fails, in milliseconds
    pub connect_timeout: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            heartbeat_interval: 30000,
            live_channel_capacity: 16,
            connect_timeout: 10000,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the heartbeat interval in milliseconds
    pub fn with_heartbeat_interval(mut self, value: u64) -> Self {
        self.heartbeat_interval = value;
        self
    }

    /// Set the live query channel capacity
    pub fn with_live_channel_capacity(mut self, value: usize) -> Self {
        self.live_channel_capacity = value;
        self
    }

    /// Set the live connect timeout in milliseconds
    pub fn with_connect_timeout(mut self, value: u64) -> Self {
        self.connect_timeout = value;
        self
    }
}
