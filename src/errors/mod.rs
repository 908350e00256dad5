/// Error taxonomy for the confirmation subsystem
///
/// Push-path variants (`Connection`, `SubscribeTimeout`, `NotificationTimeout`)
/// never escape the confirmation engine; they are demoted to a polling
/// fallback. `Polling` and `Rpc` describe node round trips, `Config` and
/// `InvalidSignature` come from the ambient layers.
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfirmError {
    #[error("Connection error ({endpoint}): {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Subscribe acknowledgment for {signature} not received within {timeout_ms}ms")]
    SubscribeTimeout { signature: String, timeout_ms: u64 },

    #[error("Subscription rejected for {signature}: {reason}")]
    SubscribeRejected { signature: String, reason: String },

    #[error("No notification for {signature} within {timeout_ms}ms")]
    NotificationTimeout { signature: String, timeout_ms: u64 },

    #[error("Transaction {signature} failed on-chain: {err}")]
    OnChainFailure { signature: String, err: Value },

    #[error("Polling error: {0}")]
    Polling(String),

    #[error("RPC error calling {method}: {message}")]
    Rpc { method: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid signature '{0}'")]
    InvalidSignature(String),
}

pub type ConfirmResult<T> = std::result::Result<T, ConfirmError>;

impl ConfirmError {
    /// Create a connection error for an endpoint
    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfirmError::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create an RPC error for a node method
    pub fn rpc(method: impl Into<String>, message: impl Into<String>) -> Self {
        ConfirmError::Rpc {
            method: method.into(),
            message: message.into(),
        }
    }

    /// True for failures of the push channel, which are always recoverable by polling
    pub fn is_push_failure(&self) -> bool {
        matches!(
            self,
            ConfirmError::Connection { .. }
                | ConfirmError::SubscribeTimeout { .. }
                | ConfirmError::SubscribeRejected { .. }
                | ConfirmError::NotificationTimeout { .. }
        )
    }
}

impl From<reqwest::Error> for ConfirmError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.host_str().unwrap_or("unknown").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        ConfirmError::Connection {
            endpoint,
            reason: format!("HTTP request failed: {}", err),
        }
    }
}
