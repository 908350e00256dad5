//! Transaction confirmation
//!
//! `ConfirmationEngine` is the entry point. It waits on the websocket push
//! channel and falls back to `PollingFallback` whenever push is unavailable.

pub mod engine;
pub mod polling;
pub mod types;

pub use engine::ConfirmationEngine;
pub use polling::{PollingFallback, PollingSettings};
pub use types::ConfirmationResult;
