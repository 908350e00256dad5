//! Inbound dispatch loop
//!
//! The only reader of the push connection. Routes subscribe acks to their
//! waiting subscribers, hands signature notifications to their callbacks and
//! keeps the connection honest with heartbeats and idle probes.

use super::connection::{PushConnection, WsSource};
use super::messages::{parse_inbound, signature_unsubscribe_request, Inbound, SignatureNotification};
use super::registry::{AckDelivery, SubscriptionRegistry};
use crate::logger::{self, LogTag};
use futures_util::StreamExt;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

pub(crate) async fn run(connection: Arc<PushConnection>, mut source: WsSource, generation: u64) {
    let settings = connection.settings().clone();
    let mut heartbeat = interval_at(
        Instant::now() + settings.heartbeat_interval,
        settings.heartbeat_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Set while a ping is unanswered
    let mut pong_deadline: Option<Instant> = None;
    let mut last_frame = Instant::now();

    let reason = loop {
        let idle_deadline = last_frame + settings.idle_timeout;

        tokio::select! {
            frame = source.next() => {
                match frame {
                    Some(Ok(message)) => {
                        last_frame = Instant::now();
                        match message {
                            Message::Text(text) => handle_text(&connection, &text).await,
                            Message::Pong(_) => pong_deadline = None,
                            Message::Close(frame) => {
                                break match frame {
                                    Some(frame) => format!(
                                        "closed by server ({} {})",
                                        u16::from(frame.code),
                                        frame.reason
                                    ),
                                    None => "closed by server".to_string(),
                                };
                            }
                            // Pings are answered by the protocol layer
                            _ => {}
                        }
                    }
                    Some(Err(e)) => break format!("read error: {}", e),
                    None => break "stream ended".to_string(),
                }
            }
            _ = heartbeat.tick() => {
                if pong_deadline.is_none() {
                    if let Err(e) = connection.send_ping().await {
                        break format!("heartbeat failed: {}", e);
                    }
                    pong_deadline = Some(Instant::now() + settings.probe_timeout);
                }
            }
            _ = sleep_until(pong_deadline.unwrap_or(idle_deadline)), if pong_deadline.is_some() => {
                break format!(
                    "no pong within {}s",
                    settings.probe_timeout.as_secs_f64()
                );
            }
            _ = sleep_until(idle_deadline) => {
                logger::debug(
                    LogTag::Websocket,
                    &format!(
                        "No frames for {}s, probing {}",
                        settings.idle_timeout.as_secs_f64(),
                        connection.url()
                    ),
                );
                if let Err(e) = connection.send_ping().await {
                    break format!("idle probe failed: {}", e);
                }
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + settings.probe_timeout);
                }
                last_frame = Instant::now();
            }
        }
    };

    logger::info(
        LogTag::Websocket,
        &format!("Dispatch loop for {} ended: {}", connection.url(), reason),
    );
    connection.on_reader_exit(generation).await;
}

async fn handle_text(connection: &PushConnection, text: &str) {
    logger::verbose(LogTag::Websocket, &format!("<- {}", text));

    match parse_inbound(text) {
        Ok(Inbound::Response { id, result }) => route_response(connection, id, result).await,
        Ok(Inbound::SignatureNotification(notification)) => {
            deliver(connection.registry(), notification)
        }
        Ok(Inbound::BareAck(subscription_id)) => route_bare_ack(connection, subscription_id).await,
        Ok(Inbound::Other) => {}
        Err(e) => logger::debug(
            LogTag::Websocket,
            &format!("Dropping unparseable frame: {}", e),
        ),
    }
}

async fn route_response(connection: &PushConnection, request_id: u64, result: Result<Value, Value>) {
    let outcome = match result {
        Ok(value) => value
            .as_u64()
            .ok_or_else(|| format!("malformed acknowledgment: {}", value)),
        Err(error) => Err(error
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| error.to_string())),
    };
    let late_subscription = outcome.as_ref().ok().copied();

    match connection.registry().complete_pending(request_id, outcome) {
        AckDelivery::Delivered(subscription_id) => logger::debug(
            LogTag::Websocket,
            &format!(
                "Request {} acknowledged as subscription {}",
                request_id, subscription_id
            ),
        ),
        AckDelivery::Rejected => logger::warning(
            LogTag::Websocket,
            &format!("Subscribe request {} rejected", request_id),
        ),
        AckDelivery::Orphaned(subscription_id) => {
            release_orphan(connection, subscription_id).await
        }
        AckDelivery::Unknown => match late_subscription {
            // Integer result for a request nobody waits on: an ack that lost the race with its timeout
            Some(subscription_id) => release_orphan(connection, subscription_id).await,
            // Unsubscribe replies and the like
            None => {}
        },
    }
}

/// An ack without a request id belongs to the oldest subscribe still waiting
async fn route_bare_ack(connection: &PushConnection, subscription_id: u64) {
    match connection.registry().complete_oldest_pending(Ok(subscription_id)) {
        AckDelivery::Delivered(_) => logger::debug(
            LogTag::Websocket,
            &format!("Unaddressed ack matched as subscription {}", subscription_id),
        ),
        AckDelivery::Orphaned(_) | AckDelivery::Unknown => {
            release_orphan(connection, subscription_id).await
        }
        AckDelivery::Rejected => {}
    }
}

/// Unsubscribe a remote subscription nobody is waiting for
async fn release_orphan(connection: &PushConnection, subscription_id: u64) {
    logger::debug(
        LogTag::Websocket,
        &format!("Releasing orphaned subscription {}", subscription_id),
    );
    let request = signature_unsubscribe_request(connection.next_request_id(), subscription_id);
    let sent = match request.to_text() {
        Ok(text) => connection.send_text(text).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(e) = sent {
        logger::debug(
            LogTag::Websocket,
            &format!("Could not release subscription {}: {}", subscription_id, e),
        );
    }
}

/// Fire the callback registered for a notification, at most once
fn deliver(registry: &SubscriptionRegistry, notification: SignatureNotification) {
    let subscription_id = notification.subscription;
    let entry = match registry.take(subscription_id) {
        Some(entry) => entry,
        None => {
            logger::verbose(
                LogTag::Websocket,
                &format!("Notification for unknown subscription {} dropped", subscription_id),
            );
            return;
        }
    };

    let signature = entry.signature;
    let callback = entry.callback;
    match catch_unwind(AssertUnwindSafe(move || callback(notification))) {
        Ok(Ok(())) => logger::debug(
            LogTag::Websocket,
            &format!(
                "Delivered notification for {} (subscription {})",
                crate::rpc::short_signature(&signature),
                subscription_id
            ),
        ),
        Ok(Err(e)) => logger::warning(
            LogTag::Websocket,
            &format!(
                "Callback for subscription {} returned an error: {}",
                subscription_id, e
            ),
        ),
        Err(_) => logger::error(
            LogTag::Websocket,
            &format!("Callback for subscription {} panicked", subscription_id),
        ),
    }
}
