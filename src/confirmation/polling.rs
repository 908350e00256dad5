//! Polling fallback
//!
//! Bounded `getSignatureStatuses` round trips. Used when the push path is
//! unavailable and works without any push connection at all.

use crate::config::PollingConfig;
use crate::confirmation::ConfirmationResult;
use crate::errors::ConfirmError;
use crate::logger::{self, LogTag};
use crate::rpc::{commitment_to_str, short_signature, NodeRpc};
use solana_sdk::commitment_config::CommitmentLevel;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PollingSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollingSettings {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            interval: Duration::from_millis(config.interval_ms),
        }
    }

    /// Upper bound on sleeping between attempts
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

pub struct PollingFallback {
    node: Arc<dyn NodeRpc>,
    settings: PollingSettings,
}

impl PollingFallback {
    pub fn new(node: Arc<dyn NodeRpc>, settings: PollingSettings) -> Self {
        Self { node, settings }
    }

    pub fn settings(&self) -> &PollingSettings {
        &self.settings
    }

    /// Poll until the commitment is reached, the transaction fails or attempts run out
    ///
    /// Never errors: a node that failed every attempt yields `TransportError`,
    /// a node that answered but never reached the commitment yields `TimedOut`.
    pub async fn poll(&self, signature: &str, commitment: CommitmentLevel) -> ConfirmationResult {
        let mut last_error: Option<ConfirmError> = None;
        let mut answered = false;

        for attempt in 1..=self.settings.max_attempts {
            match self.node.get_signature_status(signature).await {
                Ok(Some(status)) => {
                    answered = true;
                    if let Some(err) = status.err {
                        return ConfirmationResult::Failed(err);
                    }
                    if status.satisfies(commitment) {
                        logger::debug(
                            LogTag::Confirm,
                            &format!(
                                "{} reached {} after {} poll(s)",
                                short_signature(signature),
                                commitment_to_str(commitment),
                                attempt
                            ),
                        );
                        return ConfirmationResult::Confirmed;
                    }
                }
                Ok(None) => {
                    answered = true;
                    logger::verbose(
                        LogTag::Confirm,
                        &format!(
                            "{} not seen yet (attempt {}/{})",
                            short_signature(signature),
                            attempt,
                            self.settings.max_attempts
                        ),
                    );
                }
                Err(e) => {
                    logger::debug(
                        LogTag::Confirm,
                        &format!("Status poll {} failed: {}", attempt, e),
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.settings.max_attempts {
                tokio::time::sleep(self.settings.interval).await;
            }
        }

        match last_error {
            Some(e) if !answered => ConfirmationResult::TransportError(e.to_string()),
            _ => ConfirmationResult::TimedOut,
        }
    }

    /// Whether the signature reached `commitment`; any failure is `false`
    pub async fn confirm_via_polling(&self, signature: &str, commitment: CommitmentLevel) -> bool {
        self.poll(signature, commitment).await.is_success()
    }
}
