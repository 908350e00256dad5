//! Node RPC collaborators
//!
//! `NodeRpc` and `TransactionSubmitter` are the seams the confirmation engine
//! depends on; `RpcClient` implements both over HTTP JSON-RPC.

pub mod client;
pub mod endpoints;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

pub use client::RpcClient;
pub use endpoints::{derive_pubsub_url, EndpointRewriter, ProviderRule, RewriteRule, PROVIDER_RULES};
pub use types::{
    commitment_to_str, parse_commitment, short_signature, validate_signature, SignatureStatus,
};

use crate::errors::ConfirmResult;
use async_trait::async_trait;

/// Signature status lookups used by the polling fallback
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Current status of `signature`, `None` while the node has not seen it
    async fn get_signature_status(&self, signature: &str) -> ConfirmResult<Option<SignatureStatus>>;
}

/// Broadcasts signed transactions
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Send a base64-encoded signed transaction, returning its signature
    async fn send_raw_transaction(&self, tx_base64: &str) -> ConfirmResult<String>;
}
