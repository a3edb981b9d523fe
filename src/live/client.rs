//! WebSocket client for live collection queries
//!
//! One connection per client, shared by every open subscription. The
//! connection is split into a writer task draining an internal channel
//! and a reader task routing incoming snapshots to their topic. There is
//! no reconnect or backoff: a dropped connection is the backend's
//! concern, and the adapters carry no Error state for it.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::live::message::{LiveEvent, LiveMessage};
use crate::store::{CollectionQuery, Document, LiveQuery};

/// Connection state of the live client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

type TopicSenders = Arc<RwLock<HashMap<String, mpsc::Sender<Vec<Document>>>>>;

/// Live query client
pub struct LiveClient {
    url: String,
    key: String,
    next_ref: AtomicU32,
    // Active subscriptions (topic -> snapshot sender)
    topics: TopicSenders,
    // Sender for the WebSocket writer task
    socket: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
    options: ClientOptions,
    state: Arc<RwLock<ConnectionState>>,
    state_change: broadcast::Sender<ConnectionState>,
    access_token: Arc<RwLock<Option<String>>>,
}

impl LiveClient {
    /// Create a new live client
    pub fn new(url: &str, key: &str, options: ClientOptions) -> Self {
        let (state_change, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            key: key.to_string(),
            next_ref: AtomicU32::new(1),
            topics: Arc::new(RwLock::new(HashMap::new())),
            socket: Arc::new(RwLock::new(None)),
            options,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            state_change,
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bearer token sent with the connection handshake
    pub async fn set_auth(&self, token: Option<String>) {
        debug!("setting live auth token (present: {})", token.is_some());
        *self.access_token.write().await = token;
    }

    /// Receive connection state change notifications
    pub fn on_state_change(&self) -> broadcast::Receiver<ConnectionState> {
        self.state_change.subscribe()
    }

    /// The current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    fn next_ref(&self) -> String {
        self.next_ref.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn set_state(
        state: &Arc<RwLock<ConnectionState>>,
        state_change: &broadcast::Sender<ConnectionState>,
        value: ConnectionState,
    ) {
        let mut current = state.write().await;
        if *current != value {
            info!("live connection state {:?} -> {:?}", *current, value);
            *current = value;
            // Ignore send errors when nobody is listening
            let _ = state_change.send(value);
        }
    }

    /// Establish the WebSocket connection and spawn the reader/writer
    /// tasks. Returns once the handshake completes; the tasks keep
    /// running in the background.
    pub async fn connect(&self) -> Result<(), Error> {
        let base_url = Url::parse(&self.url)?;
        match base_url.scheme() {
            "http" | "ws" | "https" | "wss" => {}
            s => return Err(Error::live(format!("Unsupported URL scheme: {}", s))),
        }

        let token_param = self
            .access_token
            .read()
            .await
            .as_ref()
            .map(|t| format!("&token={}", t))
            .unwrap_or_default();

        let ws_url = format!(
            "{}?apikey={}{}",
            base_url.join("/live/v1/websocket")?,
            self.key,
            token_param
        );

        Self::set_state(&self.state, &self.state_change, ConnectionState::Connecting).await;

        let ws_stream = match connect_async(&ws_url).await {
            Ok((stream, response)) => {
                debug!("live connection established: {:?}", response.status());
                stream
            }
            Err(e) => {
                error!("live connection failed: {}", e);
                Self::set_state(&self.state, &self.state_change, ConnectionState::Disconnected)
                    .await;
                return Err(Error::live(format!("WebSocket connection failed: {}", e)));
            }
        };

        Self::set_state(&self.state, &self.state_change, ConnectionState::Connected).await;

        let (mut write, mut read) = ws_stream.split();
        let (socket_tx, mut socket_rx) = mpsc::channel::<Message>(100);
        *self.socket.write().await = Some(socket_tx.clone());

        // Writer task: drain the internal channel into the socket.
        let writer_socket = self.socket.clone();
        let writer_state = self.state.clone();
        let writer_state_change = self.state_change.clone();
        tokio::spawn(async move {
            while let Some(message) = socket_rx.recv().await {
                trace!("live writer sending: {:?}", message);
                if let Err(e) = write.send(message).await {
                    error!("live writer send error: {}", e);
                    *writer_socket.write().await = None;
                    Self::set_state(&writer_state, &writer_state_change, ConnectionState::Disconnected)
                        .await;
                    socket_rx.close();
                    break;
                }
            }
            debug!("live writer task finished");
        });

        // Reader task: route snapshots to their topic, send heartbeats.
        let reader_topics = self.topics.clone();
        let reader_socket = self.socket.clone();
        let reader_state = self.state.clone();
        let reader_state_change = self.state_change.clone();
        let heartbeat = Duration::from_millis(self.options.heartbeat_interval);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    msg = read.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::route_text(&reader_topics, &text).await;
                            }
                            Some(Ok(msg)) if msg.is_close() => {
                                debug!("live reader received close frame");
                                break;
                            }
                            Some(Ok(msg)) => {
                                trace!("live reader ignoring frame: {:?}", msg);
                            }
                            Some(Err(e)) => {
                                error!("live reader error: {}", e);
                                break;
                            }
                            None => {
                                debug!("live stream closed by remote");
                                break;
                            }
                        }
                    }

                    _ = sleep(heartbeat) => {
                        let message = json!({
                            "topic": "system",
                            "event": LiveEvent::Heartbeat,
                            "payload": {},
                            "ref": serde_json::Value::Null,
                        });
                        if socket_tx.send(Message::Text(message.to_string())).await.is_err() {
                            error!("live heartbeat failed, assuming connection lost");
                            break;
                        }
                    }
                }
            }
            Self::set_state(&reader_state, &reader_state_change, ConnectionState::Disconnected)
                .await;
            *reader_socket.write().await = None;
            debug!("live reader task finished");
        });

        Ok(())
    }

    /// Parse an incoming text frame and deliver it to its topic
    async fn route_text(topics: &TopicSenders, text: &str) {
        let message: LiveMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                error!("failed to parse live message: {}. Raw: {}", e, text);
                return;
            }
        };

        match message.event {
            LiveEvent::Snapshot => {
                let docs = message.payload.get("docs").and_then(|d| d.as_array());
                let docs = match docs {
                    Some(docs) => docs,
                    None => {
                        warn!("snapshot for {} without docs payload", message.topic);
                        return;
                    }
                };
                let mut batch = Vec::with_capacity(docs.len());
                for doc in docs {
                    match Document::from_value(doc.clone()) {
                        Ok(doc) => batch.push(doc),
                        Err(e) => warn!("skipping malformed document on {}: {}", message.topic, e),
                    }
                }

                let senders = topics.read().await;
                if let Some(tx) = senders.get(&message.topic) {
                    // Each snapshot is the full result set, so dropping an
                    // old buffered one when the channel is full loses
                    // nothing the latest push does not carry.
                    if let Err(e) = tx.try_send(batch) {
                        warn!("dropping snapshot for {}: {}", message.topic, e);
                    }
                } else {
                    warn!("snapshot for unknown topic {}", message.topic);
                }
            }
            LiveEvent::Error => {
                error!("server error on {}: {:?}", message.topic, message.payload);
            }
            LiveEvent::Close => {
                debug!("server closed topic {}", message.topic);
                topics.write().await.remove(&message.topic);
            }
            other => {
                trace!("ignoring live event {:?} on {}", other, message.topic);
            }
        }
    }

    /// Wait until the connection is up, starting it if necessary
    async fn ensure_connected(&self) -> Result<(), Error> {
        if self.connection_state().await == ConnectionState::Connected {
            return Ok(());
        }

        let mut rx = self.on_state_change();
        self.connect().await?;
        if self.connection_state().await == ConnectionState::Connected {
            return Ok(());
        }

        let wait = timeout(Duration::from_millis(self.options.connect_timeout), async {
            loop {
                match rx.recv().await {
                    Ok(ConnectionState::Connected) => break Ok(()),
                    Ok(ConnectionState::Connecting) => continue,
                    Ok(state) => {
                        break Err(Error::live(format!(
                            "Connection attempt resulted in state {:?}",
                            state
                        )))
                    }
                    Err(_) => break Err(Error::live("State change receiver closed")),
                }
            }
        })
        .await;

        match wait {
            Ok(result) => result,
            Err(_) => Err(Error::live("Timeout waiting for live connection")),
        }
    }

    /// Open a live query. The returned [`LiveQuery`] receives the full
    /// result set on the initial push and on every subsequent change;
    /// dropping it closes the topic.
    pub async fn subscribe(&self, query: &CollectionQuery) -> Result<LiveQuery, Error> {
        self.ensure_connected().await?;

        let topic = format!("{}:{}", query.collection, uuid::Uuid::new_v4());
        let (tx, rx) = mpsc::channel(self.options.live_channel_capacity);
        self.topics.write().await.insert(topic.clone(), tx);

        let socket_guard = self.socket.read().await;
        let socket_tx = match socket_guard.as_ref() {
            Some(tx) => tx.clone(),
            None => {
                drop(socket_guard);
                self.topics.write().await.remove(&topic);
                return Err(Error::live("Connected but socket sender not found"));
            }
        };
        drop(socket_guard);

        let message = json!({
            "topic": topic,
            "event": LiveEvent::Sub,
            "payload": query.to_payload(),
            "ref": self.next_ref(),
        });
        if let Err(e) = socket_tx.send(Message::Text(message.to_string())).await {
            self.topics.write().await.remove(&topic);
            return Err(Error::live(format!("Failed to send sub message: {}", e)));
        }

        info!("opened live query {}", topic);
        let guard = TopicGuard {
            topic,
            topics: self.topics.clone(),
            socket: self.socket.clone(),
        };
        Ok(LiveQuery::new(rx, Box::new(guard)))
    }

    /// Close the connection. Open subscriptions stop receiving pushes.
    pub async fn disconnect(&self) -> Result<(), Error> {
        Self::set_state(&self.state, &self.state_change, ConnectionState::Disconnected).await;
        let mut socket_guard = self.socket.write().await;
        if let Some(socket_tx) = socket_guard.take() {
            // Dropping the sender signals the writer task to exit.
            drop(socket_tx);
            info!("live connection closed");
        } else {
            debug!("disconnect: no active socket, already disconnected");
        }
        Ok(())
    }
}

/// Disposer for one live topic. Dropping it removes the routing entry
/// and tells the server to stop pushing.
struct TopicGuard {
    topic: String,
    topics: TopicSenders,
    socket: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
}

impl Drop for TopicGuard {
    fn drop(&mut self) {
        let topic = std::mem::take(&mut self.topic);
        let topics = self.topics.clone();
        let socket = self.socket.clone();
        tokio::spawn(async move {
            topics.write().await.remove(&topic);
            let socket_guard = socket.read().await;
            if let Some(socket_tx) = socket_guard.as_ref() {
                let message = json!({
                    "topic": topic,
                    "event": LiveEvent::Unsub,
                    "payload": {},
                    "ref": serde_json::Value::Null,
                });
                if let Err(e) = socket_tx.send(Message::Text(message.to_string())).await {
                    debug!("unsub for {} not sent: {}", topic, e);
                }
            }
        });
    }
}
