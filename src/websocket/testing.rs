//! In-process pubsub server for tests

use super::connection::PushSettings;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Subscription ids handed out by the mock start here
pub const FIRST_SUBSCRIPTION_ID: u64 = 42;

/// How the mock answers `signatureSubscribe`
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Ack, then a success notification after `delay`
    Confirm { delay: Duration },
    /// Ack, then a notification carrying `err` after `delay`
    Fail { delay: Duration, err: Value },
    /// Ack and never notify
    AckOnly,
    /// Never answer
    Silent,
    /// Answer with a JSON-RPC error
    Reject,
    /// Ack, then close the connection
    AckThenClose,
    /// Ack without echoing the request id, then a success notification after `delay`
    BareAck { delay: Duration },
    /// Ack, then stop reading so pings go unanswered
    AckThenStall,
}

pub struct MockPubsubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl MockPubsubServer {
    pub async fn start(reply: MockReply) -> Self {
        Self::start_with_handshake_delay(reply, Duration::ZERO).await
    }

    /// Like `start`, but each websocket handshake is held back by `delay`
    pub async fn start_with_handshake_delay(reply: MockReply, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let next_subscription = Arc::new(AtomicU64::new(FIRST_SUBSCRIPTION_ID));

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let reply = reply.clone();
                let recorded = recorded.clone();
                let next_subscription = next_subscription.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    serve_connection(stream, reply, recorded, next_subscription).await
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Every JSON request received so far, in arrival order
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn count_method(&self, method: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r["method"] == method)
            .count()
    }
}

impl Drop for MockPubsubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL nothing listens on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

/// Heartbeat and probe timings short enough to observe a dead peer
pub fn keepalive_settings(heartbeat: Duration, idle: Duration) -> PushSettings {
    PushSettings {
        heartbeat_interval: heartbeat,
        probe_timeout: Duration::from_millis(200),
        idle_timeout: idle,
        ..fast_settings()
    }
}

/// Timings short enough for tests
pub fn fast_settings() -> PushSettings {
    PushSettings {
        connect_timeout: Duration::from_secs(2),
        subscribe_ack_timeout: Duration::from_secs(2),
        heartbeat_interval: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(2),
        idle_timeout: Duration::from_secs(10),
        close_timeout: Duration::from_secs(1),
    }
}

async fn serve_connection(
    stream: TcpStream,
    reply: MockReply,
    requests: Arc<Mutex<Vec<Value>>>,
    next_subscription: Arc<AtomicU64>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };
    let (mut sink, mut source) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    while let Some(Ok(message)) = source.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let request: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => continue,
        };
        requests.lock().push(request.clone());

        let id = request["id"].clone();
        match request["method"].as_str() {
            Some("signatureSubscribe") => {
                if matches!(reply, MockReply::Silent) {
                    continue;
                }
                if matches!(reply, MockReply::Reject) {
                    let _ = out_tx.send(text_frame(json!({
                        "jsonrpc": "2.0",
                        "error": {"code": -32602, "message": "Invalid params: invalid signature"},
                        "id": id
                    })));
                    continue;
                }

                let subscription = next_subscription.fetch_add(1, Ordering::SeqCst);
                let ack = match reply {
                    MockReply::BareAck { .. } => json!({"jsonrpc": "2.0", "result": subscription}),
                    _ => json!({"jsonrpc": "2.0", "result": subscription, "id": id}),
                };
                let _ = out_tx.send(text_frame(ack));

                match &reply {
                    MockReply::Confirm { delay } | MockReply::BareAck { delay } => {
                        schedule_notification(&out_tx, *delay, subscription, Value::Null)
                    }
                    MockReply::Fail { delay, err } => {
                        schedule_notification(&out_tx, *delay, subscription, err.clone())
                    }
                    MockReply::AckThenClose => {
                        let tx = out_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            let _ = tx.send(Message::Close(None));
                        });
                    }
                    MockReply::AckThenStall => {
                        // Unread frames mean no pongs; keep the socket open
                        std::future::pending::<()>().await;
                    }
                    _ => {}
                }
            }
            Some("signatureUnsubscribe") => {
                let _ = out_tx.send(text_frame(json!({"jsonrpc": "2.0", "result": true, "id": id})));
            }
            _ => {}
        }
    }

    drop(out_tx);
    let _ = writer.await;
}

fn schedule_notification(
    out_tx: &mpsc::UnboundedSender<Message>,
    delay: Duration,
    subscription: u64,
    err: Value,
) {
    let tx = out_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(text_frame(json!({
            "jsonrpc": "2.0",
            "method": "signatureNotification",
            "params": {
                "subscription": subscription,
                "result": {"context": {"slot": 5207624}, "value": {"err": err}}
            }
        })));
    });
}

fn text_frame(value: Value) -> Message {
    Message::Text(value.to_string())
}
