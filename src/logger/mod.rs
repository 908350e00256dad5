//! Structured logging for the trading bot
//!
//! Provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via --debug-<tag> flags
//! - Colored console output with optional file mirroring
//!
//! ## Usage
//!
//! ```rust
//! use tradebot::logger::{self, LogTag};
//!
//! logger::error(LogTag::Websocket, "Connection refused");
//! logger::warning(LogTag::Confirm, "Push path timed out, polling");
//! logger::info(LogTag::Confirm, "Transaction confirmed");
//! logger::debug(LogTag::Rpc, "getSignatureStatuses -> null"); // Only if --debug-rpc
//! logger::verbose(LogTag::Websocket, "Raw frame: ..."); // Only if --verbose
//! ```
//!
//! Call `logger::init()` once at startup. Without it, info-level console
//! logging with no per-tag debug output is used.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags and opens the log file
/// when `--log-file` is present.
pub fn init() {
    config::init_from_args();

    if get_logger_config().file_logging {
        file::init_file_logging();
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, only shown with the matching --debug-<tag> flag
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, only shown with --verbose
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending log file writes
///
/// Call this during shutdown so the tail of the log reaches disk.
pub fn flush() {
    file::flush_file_logging();
}
