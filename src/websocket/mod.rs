//! Websocket push channel for signature confirmations
//!
//! - `connection`: one live socket with serialized writes and lazy connect
//! - `dispatch`: the single reader, heartbeat and idle probing
//! - `registry`: pending subscribes and live subscriptions
//! - `client`: `PubsubClient`, the subscribe/unsubscribe surface
//! - `messages`: wire frames

pub mod client;
pub mod connection;
mod dispatch;
pub mod messages;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use client::PubsubClient;
pub use connection::{ConnectionState, PushSettings};
pub use messages::SignatureNotification;
pub use registry::{SignatureCallback, SubscriptionInfo};
