/// Global constants used across the trading bot
///
/// This module contains system-wide constants that are not configurable
/// and are used across multiple modules.

// ============================================================================
// SOLANA ENDPOINT CONSTANTS
// ============================================================================

/// Public mainnet HTTP RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// PUSH CHANNEL DEFAULTS
// ============================================================================

/// Time allowed for the websocket handshake
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Time allowed for a `signatureSubscribe` acknowledgment
pub const DEFAULT_SUBSCRIBE_ACK_TIMEOUT_SECS: u64 = 10;

/// Interval between keep-alive pings
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 20;

/// Time a ping may go unanswered before the connection is declared dead
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Read silence that triggers a liveness probe
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;

/// Time allowed for a graceful close handshake
pub const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// CONFIRMATION DEFAULTS
// ============================================================================

/// Default commitment requested for confirmations
pub const DEFAULT_COMMITMENT: &str = "confirmed";

/// Default time to wait for a push notification before polling
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;

/// Default number of `getSignatureStatuses` round trips in the fallback
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;

/// Default delay between fallback round trips
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// HTTP request timeout for node RPC calls
pub const DEFAULT_RPC_REQUEST_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// FILESYSTEM
// ============================================================================

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Log file location when file logging is enabled
pub const LOG_FILE_PATH: &str = "logs/tradebot.log";
