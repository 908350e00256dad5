//! Confirmation engine
//!
//! `confirm` tries the push path first: subscribe, wait for the notification
//! up to the caller's timeout, unsubscribe. Any push failure demotes the
//! attempt to the polling fallback, so callers only ever see a
//! `ConfirmationResult`.

use super::polling::{PollingFallback, PollingSettings};
use super::types::ConfirmationResult;
use crate::config::Config;
use crate::errors::{ConfirmError, ConfirmResult};
use crate::logger::{self, LogTag};
use crate::rpc::{
    commitment_to_str, derive_pubsub_url, short_signature, NodeRpc, RpcClient,
    TransactionSubmitter,
};
use crate::websocket::{PubsubClient, PushSettings, SignatureCallback, SignatureNotification};
use serde_json::Value;
use solana_sdk::commitment_config::CommitmentLevel;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Where the push path gave up
enum PushFailure {
    /// No subscription was established
    Subscribe(ConfirmError),
    /// Subscribed, but no notification arrived
    Wait(ConfirmError),
}

impl PushFailure {
    fn error(&self) -> &ConfirmError {
        match self {
            PushFailure::Subscribe(e) | PushFailure::Wait(e) => e,
        }
    }
}

pub struct ConfirmationEngine {
    pubsub: Option<PubsubClient>,
    poller: PollingFallback,
    submitter: Option<Arc<dyn TransactionSubmitter>>,
}

impl ConfirmationEngine {
    /// Engine without push support when `pubsub` is `None`
    pub fn new(pubsub: Option<PubsubClient>, poller: PollingFallback) -> Self {
        Self {
            pubsub,
            poller,
            submitter: None,
        }
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn TransactionSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Build from the global configuration
    pub fn from_config() -> ConfirmResult<Self> {
        Self::from_config_with(&crate::config::get_config_clone())
    }

    /// Build from an explicit configuration
    pub fn from_config_with(config: &Config) -> ConfirmResult<Self> {
        let rpc = Arc::new(RpcClient::new(
            &config.rpc.url,
            Duration::from_secs(config.rpc.request_timeout_secs),
        )?);
        let node: Arc<dyn NodeRpc> = rpc.clone();
        let poller = PollingFallback::new(node, PollingSettings::from_config(&config.polling));

        let pubsub = if config.websocket.enabled {
            let url = config
                .websocket
                .url
                .clone()
                .or_else(|| derive_pubsub_url(&config.rpc.url));
            match url {
                Some(url) => Some(PubsubClient::new(
                    &url,
                    PushSettings::from_config(&config.websocket),
                )),
                None => {
                    logger::warning(
                        LogTag::Confirm,
                        &format!(
                            "No pubsub endpoint for {}, confirmations will poll",
                            config.rpc.url
                        ),
                    );
                    None
                }
            }
        } else {
            logger::info(LogTag::Confirm, "Push confirmations disabled, polling only");
            None
        };

        Ok(Self::new(pubsub, poller).with_submitter(rpc))
    }

    pub fn push_enabled(&self) -> bool {
        self.pubsub.is_some()
    }

    pub fn pubsub(&self) -> Option<&PubsubClient> {
        self.pubsub.as_ref()
    }

    /// Confirm `signature` at `commitment`
    ///
    /// The push wait is bounded by `timeout`; the fallback then runs its own
    /// bounded number of polls. Exactly one result per call.
    pub async fn confirm(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        timeout: Duration,
    ) -> ConfirmationResult {
        let started = Instant::now();
        let short = short_signature(signature);

        let push = match &self.pubsub {
            Some(pubsub) => self.await_push(pubsub, signature, commitment, timeout).await,
            None => Err(PushFailure::Subscribe(ConfirmError::Config(
                "push channel disabled".to_string(),
            ))),
        };

        let result = match push {
            Ok(None) => ConfirmationResult::Confirmed,
            Ok(Some(err)) => ConfirmationResult::Failed(err),
            Err(failure) => {
                if self.pubsub.is_some() {
                    logger::warning(
                        LogTag::Confirm,
                        &format!("Push path for {} gave up ({}), polling", short, failure.error()),
                    );
                }
                self.poller.poll(signature, commitment).await
            }
        };

        logger::info(
            LogTag::Confirm,
            &format!(
                "{} -> {} at {} in {}ms",
                short,
                result.label(),
                commitment_to_str(commitment),
                started.elapsed().as_millis()
            ),
        );
        result
    }

    /// Push path only, no fallback
    ///
    /// Subscription problems surface as `SubscribeFailed`, a missing
    /// notification as `TimedOut` and a lost connection as `TransportError`.
    pub async fn confirm_push_only(
        &self,
        signature: &str,
        commitment: CommitmentLevel,
        timeout: Duration,
    ) -> ConfirmationResult {
        let pubsub = match &self.pubsub {
            Some(pubsub) => pubsub,
            None => return ConfirmationResult::SubscribeFailed("push channel disabled".to_string()),
        };

        match self.await_push(pubsub, signature, commitment, timeout).await {
            Ok(None) => ConfirmationResult::Confirmed,
            Ok(Some(err)) => ConfirmationResult::Failed(err),
            Err(PushFailure::Subscribe(e)) => ConfirmationResult::SubscribeFailed(e.to_string()),
            Err(PushFailure::Wait(ConfirmError::NotificationTimeout { .. })) => {
                ConfirmationResult::TimedOut
            }
            Err(PushFailure::Wait(e)) => ConfirmationResult::TransportError(e.to_string()),
        }
    }

    /// Submit a signed transaction, then confirm it
    ///
    /// Submission failures are returned as errors since there is no
    /// signature to confirm.
    pub async fn submit_and_confirm(
        &self,
        tx_base64: &str,
        commitment: CommitmentLevel,
        timeout: Duration,
    ) -> ConfirmResult<(String, ConfirmationResult)> {
        let submitter = self
            .submitter
            .as_ref()
            .ok_or_else(|| ConfirmError::Config("no transaction submitter configured".to_string()))?;

        let signature = submitter.send_raw_transaction(tx_base64).await?;
        logger::info(
            LogTag::Confirm,
            &format!("Submitted {}, confirming", short_signature(&signature)),
        );

        let result = self.confirm(&signature, commitment, timeout).await;
        Ok((signature, result))
    }

    /// Close the push channel
    pub async fn shutdown(&self) {
        if let Some(pubsub) = &self.pubsub {
            pubsub.disconnect().await;
        }
    }

    /// Subscribe, wait for the notification's error field, always unsubscribe
    async fn await_push(
        &self,
        pubsub: &PubsubClient,
        signature: &str,
        commitment: CommitmentLevel,
        timeout: Duration,
    ) -> Result<Option<Value>, PushFailure> {
        // One deadline bounds connect, ack and notification
        let deadline = tokio::time::Instant::now() + timeout;
        let (tx, rx) = oneshot::channel::<Option<Value>>();
        let callback: SignatureCallback = Box::new(move |notification: SignatureNotification| {
            tx.send(notification.err)
                .map_err(|_| "confirmation waiter already gone".to_string())
        });

        let subscription_id = pubsub
            .subscribe_before(signature, commitment, callback, deadline)
            .await
            .map_err(PushFailure::Subscribe)?;

        let outcome = match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(err)) => Ok(err),
            Ok(Err(_)) => Err(PushFailure::Wait(ConfirmError::connection(
                pubsub.url(),
                "connection lost while waiting for notification",
            ))),
            Err(_) => Err(PushFailure::Wait(ConfirmError::NotificationTimeout {
                signature: signature.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })),
        };

        // Already gone after delivery; the result does not matter
        let _ = pubsub.unsubscribe_signature(subscription_id).await;
        outcome
    }
}
