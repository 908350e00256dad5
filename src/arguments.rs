/// Centralized argument handling for the trading bot
///
/// Consolidates command-line argument parsing and debug flag checking
/// for the main binary and library modules.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Debug flag checking functions for every log tag
/// - Shared argument patterns used by the binaries
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by binaries and tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
/// Returns a vector clone to avoid holding the mutex lock
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Push channel (websocket) debug mode
pub fn is_debug_websocket_enabled() -> bool {
    has_arg("--debug-websocket")
}

/// Confirmation engine debug mode
pub fn is_debug_confirm_enabled() -> bool {
    has_arg("--debug-confirm")
}

/// Node RPC debug mode
pub fn is_debug_rpc_enabled() -> bool {
    has_arg("--debug-rpc")
}

/// Configuration loading debug mode
pub fn is_debug_config_enabled() -> bool {
    has_arg("--debug-config")
}

/// Disables the push channel regardless of configuration
pub fn is_polling_only_enabled() -> bool {
    has_arg("--polling-only")
}

/// Gets a list of all enabled debug modes
pub fn get_enabled_debug_modes() -> Vec<&'static str> {
    let mut modes = Vec::new();

    if is_debug_websocket_enabled() {
        modes.push("websocket");
    }
    if is_debug_confirm_enabled() {
        modes.push("confirm");
    }
    if is_debug_rpc_enabled() {
        modes.push("rpc");
    }
    if is_debug_config_enabled() {
        modes.push("config");
    }
    if is_polling_only_enabled() {
        modes.push("polling-only");
    }

    modes
}

/// Prints debug information about current arguments and enabled debug modes
pub fn print_debug_info() {
    let enabled_modes = get_enabled_debug_modes();
    if !enabled_modes.is_empty() {
        println!("Enabled debug modes: {:?}", enabled_modes);
    }
}

/// Prints usage for the main binary
pub fn print_help() {
    println!("tradebot - submit and confirm Solana transactions");
    println!();
    println!("USAGE:");
    println!("  tradebot --signature <SIG> [OPTIONS]");
    println!("  tradebot --submit <BASE64_TX> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --config <PATH>        Configuration file (default: data/config.toml)");
    println!("  --commitment <LEVEL>   processed | confirmed | finalized");
    println!("  --timeout <SECS>       Push confirmation timeout");
    println!("  --polling-only         Skip the websocket push channel");
    println!("  --log-file             Mirror logs into logs/tradebot.log");
    println!("  --verbose, -v          Verbose logging");
    println!("  --quiet, -q            Errors only");
    println!("  --debug-<tag>          Debug logs for websocket | confirm | rpc | config");
    println!("  --help, -h             Show this message");
}

// =============================================================================
// COMMON ARGUMENT PATTERNS
// =============================================================================

/// Common argument parsing patterns used across binaries
pub mod patterns {
    use super::*;

    /// Checks for help flags
    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    /// Signature to confirm
    pub fn get_signature() -> Option<String> {
        get_arg_value("--signature")
    }

    /// Base64-encoded signed transaction to submit
    pub fn get_submit_payload() -> Option<String> {
        get_arg_value("--submit")
    }

    /// Configuration file override
    pub fn get_config_path() -> Option<String> {
        get_arg_value("--config")
    }

    /// Commitment level override
    pub fn get_commitment() -> Option<String> {
        get_arg_value("--commitment")
    }

    /// Push timeout override in seconds
    pub fn get_timeout_seconds() -> Option<u64> {
        get_arg_value("--timeout").and_then(|s| s.parse().ok())
    }
}
