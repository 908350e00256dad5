//! Signature subscriptions over the push channel

use super::connection::{ConnectionState, PushConnection, PushSettings};
use super::messages::{signature_subscribe_request, signature_unsubscribe_request};
use super::registry::{SignatureCallback, SubscriptionInfo};
use crate::errors::{ConfirmError, ConfirmResult};
use crate::logger::{self, LogTag};
use crate::rpc::short_signature;
use solana_sdk::commitment_config::CommitmentLevel;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Subscribe/unsubscribe front end for one pubsub endpoint
pub struct PubsubClient {
    connection: Arc<PushConnection>,
}

impl PubsubClient {
    pub fn new(url: &str, settings: PushSettings) -> Self {
        Self {
            connection: PushConnection::new(url, settings),
        }
    }

    pub fn url(&self) -> &str {
        self.connection.url()
    }

    pub fn settings(&self) -> &PushSettings {
        self.connection.settings()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Cheap when already connected
    pub async fn ensure_connected(&self) -> bool {
        self.connection.ensure_connected().await
    }

    /// Subscribe to one signature
    ///
    /// Returns the provider's subscription id once acknowledged, `None` on any
    /// connection failure, rejection or ack timeout.
    pub async fn subscribe_signature(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        callback: SignatureCallback,
    ) -> Option<u64> {
        let ack_timeout = self.settings().subscribe_ack_timeout;
        match self
            .subscribe_with_ack_timeout(signature, commitment, callback, ack_timeout)
            .await
        {
            Ok(subscription_id) => Some(subscription_id),
            Err(e) => {
                logger::warning(LogTag::Websocket, &format!("Subscribe failed: {}", e));
                None
            }
        }
    }

    /// Subscribe with an explicit ack bound, reporting why it failed
    pub async fn subscribe_with_ack_timeout(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        callback: SignatureCallback,
        ack_timeout: Duration,
    ) -> ConfirmResult<u64> {
        self.subscribe_within(signature, commitment, callback, ack_timeout, None)
            .await
    }

    /// Subscribe, finishing connect and ack before `deadline`
    ///
    /// The ack wait is also capped by the configured ack timeout. A pending
    /// request that runs out of time is withdrawn from the registry.
    pub async fn subscribe_before(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        callback: SignatureCallback,
        deadline: Instant,
    ) -> ConfirmResult<u64> {
        let ack_timeout = self.settings().subscribe_ack_timeout;
        self.subscribe_within(signature, commitment, callback, ack_timeout, Some(deadline))
            .await
    }

    async fn subscribe_within(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        callback: SignatureCallback,
        ack_timeout: Duration,
        deadline: Option<Instant>,
    ) -> ConfirmResult<u64> {
        let connected = match deadline {
            Some(deadline) => {
                tokio::time::timeout_at(deadline, self.connection.ensure_connected())
                    .await
                    .unwrap_or(false)
            }
            None => self.connection.ensure_connected().await,
        };
        if !connected {
            return Err(ConfirmError::connection(
                self.url(),
                "push channel unavailable",
            ));
        }

        let registry = self.connection.registry();
        let request_id = self.connection.next_request_id();
        let text = signature_subscribe_request(request_id, signature, commitment)
            .to_text()
            .map_err(|e| ConfirmError::connection(self.url(), format!("encode failed: {}", e)))?;

        let mut ack = registry.register_pending(request_id, signature, commitment, callback);
        if let Err(e) = self.connection.send_text(text).await {
            registry.cancel_pending(request_id);
            return Err(e);
        }

        let mut ack_deadline = Instant::now() + ack_timeout;
        if let Some(deadline) = deadline {
            ack_deadline = ack_deadline.min(deadline);
        }
        let ack_wait = ack_deadline.saturating_duration_since(Instant::now());

        match tokio::time::timeout_at(ack_deadline, &mut ack).await {
            Ok(Ok(Ok(subscription_id))) => {
                logger::debug(
                    LogTag::Websocket,
                    &format!(
                        "Subscribed to {} as {}",
                        short_signature(signature),
                        subscription_id
                    ),
                );
                Ok(subscription_id)
            }
            Ok(Ok(Err(reason))) => Err(ConfirmError::SubscribeRejected {
                signature: signature.to_string(),
                reason,
            }),
            Ok(Err(_)) => Err(ConfirmError::connection(
                self.url(),
                "connection lost before acknowledgment",
            )),
            Err(_) => {
                if !registry.cancel_pending(request_id) {
                    // The ack was routed between the timeout and the cancel
                    if let Ok(Ok(subscription_id)) = ack.try_recv() {
                        return Ok(subscription_id);
                    }
                }
                Err(ConfirmError::SubscribeTimeout {
                    signature: signature.to_string(),
                    timeout_ms: ack_wait.as_millis() as u64,
                })
            }
        }
    }

    /// Best-effort unsubscribe
    ///
    /// The local entry is always removed. Returns false when there is no
    /// connection or the id is not registered, true once the request is sent.
    pub async fn unsubscribe_signature(&self, subscription_id: u64) -> bool {
        let removed = self.connection.registry().remove(subscription_id);
        if !removed || !self.connection.is_connected() {
            return false;
        }

        let request =
            signature_unsubscribe_request(self.connection.next_request_id(), subscription_id);
        let text = match request.to_text() {
            Ok(text) => text,
            Err(_) => return false,
        };

        match self.connection.send_text(text).await {
            Ok(()) => true,
            Err(e) => {
                logger::debug(
                    LogTag::Websocket,
                    &format!("Unsubscribe {} not sent: {}", subscription_id, e),
                );
                false
            }
        }
    }

    pub fn active_subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.connection.registry().snapshot()
    }

    /// Subscribe requests still waiting for their ack
    pub fn pending_subscriptions(&self) -> usize {
        self.connection.registry().pending_len()
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }
}

impl Drop for PubsubClient {
    fn drop(&mut self) {
        // The dispatch task holds the connection alive; stop it with us
        self.connection.abort_reader();
    }
}
