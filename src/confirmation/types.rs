/// Terminal outcome of a confirmation attempt
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationResult {
    /// Reached the requested commitment without error
    Confirmed,
    /// Landed on-chain with an error, carries the node's error payload
    Failed(Value),
    /// Neither path saw the requested commitment in time
    TimedOut,
    /// The push subscription could not be established
    SubscribeFailed(String),
    /// The node could not be reached
    TransportError(String),
}

impl ConfirmationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ConfirmationResult::Confirmed)
    }

    /// True when the outcome is final on-chain, either way
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ConfirmationResult::Confirmed | ConfirmationResult::Failed(_)
        )
    }

    /// Short machine-friendly label for audit logs
    pub fn label(&self) -> &'static str {
        match self {
            ConfirmationResult::Confirmed => "confirmed",
            ConfirmationResult::Failed(_) => "failed",
            ConfirmationResult::TimedOut => "timed_out",
            ConfirmationResult::SubscribeFailed(_) => "subscribe_failed",
            ConfirmationResult::TransportError(_) => "transport_error",
        }
    }

    /// Human-readable line for users; transport details stay in the logs
    pub fn summary(&self, signature: &str) -> String {
        match self {
            ConfirmationResult::Confirmed => format!("Transaction {} confirmed", signature),
            ConfirmationResult::Failed(err) => {
                format!("Transaction {} failed on-chain: {}", signature, err)
            }
            ConfirmationResult::TimedOut
            | ConfirmationResult::SubscribeFailed(_)
            | ConfirmationResult::TransportError(_) => {
                format!("Could not confirm transaction {} before timeout", signature)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_labels_and_success() {
        assert!(ConfirmationResult::Confirmed.is_success());
        assert!(!ConfirmationResult::TimedOut.is_success());
        assert!(ConfirmationResult::Failed(json!("x")).is_final());
        assert!(!ConfirmationResult::TransportError("down".into()).is_final());
        assert_eq!(ConfirmationResult::TimedOut.label(), "timed_out");
        assert_eq!(
            ConfirmationResult::SubscribeFailed("ack".into()).label(),
            "subscribe_failed"
        );
    }

    #[test]
    fn test_summary_hides_transport_detail() {
        let summary =
            ConfirmationResult::TransportError("tls handshake eof".into()).summary("sigX");
        assert!(summary.contains("sigX"));
        assert!(!summary.contains("tls"));

        let failed = ConfirmationResult::Failed(json!({"InstructionError": [1, "InvalidAccountData"]}))
            .summary("sigY");
        assert!(failed.contains("InvalidAccountData"));
    }
}
