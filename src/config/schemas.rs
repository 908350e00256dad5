/// Configuration schemas - every config section defined once with defaults
///
/// Each struct is declared with the `config_struct!` macro, which provides
/// embedded defaults and serde support.
use crate::config_struct;
use crate::constants::*;

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// Node HTTP RPC endpoint
    pub struct RpcConfig {
        /// HTTP(S) JSON-RPC endpoint used for polling and submission
        url: String = DEFAULT_RPC_URL.to_string(),
        /// Per-request timeout
        request_timeout_secs: u64 = DEFAULT_RPC_REQUEST_TIMEOUT_SECS,
    }
}

// ============================================================================
// PUSH CHANNEL CONFIGURATION
// ============================================================================

config_struct! {
    /// Websocket push channel used for signature subscriptions
    pub struct WebsocketConfig {
        /// Use push confirmations at all
        enabled: bool = true,
        /// Explicit pubsub URL; derived from `rpc.url` when absent
        url: Option<String> = None,
        connect_timeout_secs: u64 = DEFAULT_CONNECT_TIMEOUT_SECS,
        subscribe_ack_timeout_secs: u64 = DEFAULT_SUBSCRIBE_ACK_TIMEOUT_SECS,
        heartbeat_interval_secs: u64 = DEFAULT_HEARTBEAT_INTERVAL_SECS,
        probe_timeout_secs: u64 = DEFAULT_PROBE_TIMEOUT_SECS,
        idle_timeout_secs: u64 = DEFAULT_IDLE_TIMEOUT_SECS,
        close_timeout_secs: u64 = DEFAULT_CLOSE_TIMEOUT_SECS,
    }
}

// ============================================================================
// CONFIRMATION CONFIGURATION
// ============================================================================

config_struct! {
    /// Confirmation engine defaults
    pub struct ConfirmationConfig {
        /// processed | confirmed | finalized
        commitment: String = DEFAULT_COMMITMENT.to_string(),
        /// Time to wait for a push notification before polling
        timeout_secs: u64 = DEFAULT_CONFIRMATION_TIMEOUT_SECS,
    }
}

config_struct! {
    /// Polling fallback bounds
    pub struct PollingConfig {
        max_attempts: u32 = DEFAULT_POLL_MAX_ATTEMPTS,
        interval_ms: u64 = DEFAULT_POLL_INTERVAL_MS,
    }
}

// ============================================================================
// FEE CONFIGURATION
// ============================================================================

config_struct! {
    /// Compute-unit price per priority tier, in micro-lamports
    pub struct FeesConfig {
        /// Used when no tier is requested; 0 means "let the router decide"
        cu_price_micro_default: u64 = 0,
        cu_price_micro_fast: u64 = 500,
        cu_price_micro_turbo: u64 = 2_000,
        cu_price_micro_ultra: u64 = 10_000,
    }
}

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        websocket: WebsocketConfig = WebsocketConfig::default(),
        confirmation: ConfirmationConfig = ConfirmationConfig::default(),
        polling: PollingConfig = PollingConfig::default(),
        fees: FeesConfig = FeesConfig::default(),
    }
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

impl Config {
    /// Validate cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc.url.trim().is_empty() {
            return Err("rpc.url cannot be empty".to_string());
        }

        if crate::rpc::parse_commitment(&self.confirmation.commitment).is_none() {
            return Err(format!(
                "confirmation.commitment '{}' must be processed, confirmed or finalized",
                self.confirmation.commitment
            ));
        }

        if self.confirmation.timeout_secs == 0 {
            return Err("confirmation.timeout_secs must be greater than 0".to_string());
        }

        if self.polling.max_attempts == 0 {
            return Err("polling.max_attempts must be at least 1".to_string());
        }

        if self.websocket.subscribe_ack_timeout_secs == 0 || self.websocket.probe_timeout_secs == 0
        {
            return Err("websocket timeouts must be greater than 0".to_string());
        }

        Ok(())
    }
}
