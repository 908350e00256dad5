//! Push channel connection
//!
//! At most one live websocket per `PushConnection`. The read half belongs to
//! the dispatch task; the write half sits behind an async mutex so frames
//! from concurrent subscribers never interleave.

use super::dispatch;
use super::registry::SubscriptionRegistry;
use crate::config::WebsocketConfig;
use crate::errors::{ConfirmError, ConfirmResult};
use crate::logger::{self, LogTag};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        }
    }
}

/// Timing knobs for the push channel
#[derive(Debug, Clone, PartialEq)]
pub struct PushSettings {
    pub connect_timeout: Duration,
    pub subscribe_ack_timeout: Duration,
    pub heartbeat_interval: Duration,
    /// Time a ping may stay unanswered, also bounds each frame write
    pub probe_timeout: Duration,
    pub idle_timeout: Duration,
    pub close_timeout: Duration,
}

impl PushSettings {
    pub fn from_config(config: &WebsocketConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            subscribe_ack_timeout: Duration::from_secs(config.subscribe_ack_timeout_secs),
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            close_timeout: Duration::from_secs(config.close_timeout_secs),
        }
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self::from_config(&WebsocketConfig::default())
    }
}

pub struct PushConnection {
    url: String,
    settings: PushSettings,
    state: parking_lot::Mutex<ConnectionState>,
    writer: tokio::sync::Mutex<Option<WsSink>>,
    /// Serializes connect, disconnect and reader teardown
    connect_lock: tokio::sync::Mutex<()>,
    registry: Arc<SubscriptionRegistry>,
    next_request_id: AtomicU64,
    /// Bumped on every connect and disconnect so a stale reader cannot tear down its successor
    generation: AtomicU64,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl PushConnection {
    pub fn new(url: &str, settings: PushSettings) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            settings,
            state: parking_lot::Mutex::new(ConnectionState::Disconnected),
            writer: tokio::sync::Mutex::new(None),
            connect_lock: tokio::sync::Mutex::new(()),
            registry: Arc::new(SubscriptionRegistry::new()),
            next_request_id: AtomicU64::new(1),
            generation: AtomicU64::new(0),
            reader: parking_lot::Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn settings(&self) -> &PushSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    /// Next JSON-RPC request id, never reused
    pub fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Open the connection unless it is already live
    ///
    /// Failures are logged and reported as `false`.
    pub async fn ensure_connected(self: &Arc<Self>) -> bool {
        if self.is_connected() {
            return true;
        }

        let _guard = self.connect_lock.lock().await;
        if self.is_connected() {
            return true;
        }

        self.set_state(ConnectionState::Connecting);
        logger::debug(
            LogTag::Websocket,
            &format!("Connecting to pubsub endpoint {}", self.url),
        );

        let stream = match tokio::time::timeout(
            self.settings.connect_timeout,
            connect_async(self.url.as_str()),
        )
        .await
        {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                logger::warning(
                    LogTag::Websocket,
                    &format!("Failed to connect to {}: {}", self.url, e),
                );
                return false;
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                logger::warning(
                    LogTag::Websocket,
                    &format!(
                        "Connection to {} timed out after {}s",
                        self.url,
                        self.settings.connect_timeout.as_secs_f64()
                    ),
                );
                return false;
            }
        };

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(ConnectionState::Connected);

        let handle = tokio::spawn(dispatch::run(self.clone(), source, generation));
        if let Some(previous) = self.reader.lock().replace(handle) {
            previous.abort();
        }

        logger::info(
            LogTag::Websocket,
            &format!("Push channel connected to {}", self.url),
        );
        true
    }

    async fn send_message(&self, message: Message) -> ConfirmResult<()> {
        let mut writer = self.writer.lock().await;
        let sink = writer
            .as_mut()
            .ok_or_else(|| ConfirmError::connection(&self.url, "not connected"))?;

        match tokio::time::timeout(self.settings.probe_timeout, sink.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConfirmError::connection(
                &self.url,
                format!("send failed: {}", e),
            )),
            Err(_) => Err(ConfirmError::connection(&self.url, "send timed out")),
        }
    }

    /// Write one text frame
    pub async fn send_text(&self, text: String) -> ConfirmResult<()> {
        logger::verbose(LogTag::Websocket, &format!("-> {}", text));
        self.send_message(Message::Text(text)).await
    }

    /// Write a liveness probe
    pub async fn send_ping(&self) -> ConfirmResult<()> {
        self.send_message(Message::Ping(Vec::new())).await
    }

    /// Close the connection and purge every subscription
    ///
    /// Never fails. Waiters on purged entries observe a closed channel.
    pub async fn disconnect(&self) {
        let _guard = self.connect_lock.lock().await;
        if self.state() == ConnectionState::Disconnected && self.registry.is_empty() {
            return;
        }

        self.set_state(ConnectionState::Closing);
        self.generation.fetch_add(1, Ordering::SeqCst);

        let sink = self.writer.lock().await.take();
        if let Some(mut sink) = sink {
            match tokio::time::timeout(self.settings.close_timeout, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => logger::debug(
                    LogTag::Websocket,
                    &format!("Ignoring close error on {}: {}", self.url, e),
                ),
                Err(_) => logger::debug(
                    LogTag::Websocket,
                    &format!("Close handshake with {} timed out", self.url),
                ),
            }
        }

        self.abort_reader();
        let purged = self.registry.purge();
        self.set_state(ConnectionState::Disconnected);

        logger::info(
            LogTag::Websocket,
            &format!(
                "Push channel to {} closed ({} subscriptions purged)",
                self.url, purged
            ),
        );
    }

    /// Stop the dispatch task without touching connection state
    pub(crate) fn abort_reader(&self) {
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
    }

    /// Called by the dispatch task once its read loop ends
    pub(crate) async fn on_reader_exit(&self, generation: u64) {
        let _guard = self.connect_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.writer.lock().await.take();
        self.reader.lock().take();
        let purged = self.registry.purge();
        self.set_state(ConnectionState::Disconnected);

        if purged > 0 {
            logger::warning(
                LogTag::Websocket,
                &format!(
                    "Push channel to {} lost with {} subscriptions outstanding",
                    self.url, purged
                ),
            );
        }
    }
}
