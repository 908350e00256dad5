//! Shared RPC types: commitment helpers, signature status, signature validation

use crate::errors::ConfirmError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::signature::Signature;
use std::str::FromStr;

/// Wire name of a commitment level
pub fn commitment_to_str(commitment: CommitmentLevel) -> &'static str {
    match commitment {
        CommitmentLevel::Finalized => "finalized",
        CommitmentLevel::Confirmed => "confirmed",
        CommitmentLevel::Processed => "processed",
    }
}

/// Parse a commitment level name (case-insensitive)
pub fn parse_commitment(value: &str) -> Option<CommitmentLevel> {
    match value.trim().to_lowercase().as_str() {
        "processed" => Some(CommitmentLevel::Processed),
        "confirmed" => Some(CommitmentLevel::Confirmed),
        "finalized" => Some(CommitmentLevel::Finalized),
        _ => None,
    }
}

fn commitment_rank(commitment: CommitmentLevel) -> u8 {
    match commitment {
        CommitmentLevel::Processed => 0,
        CommitmentLevel::Confirmed => 1,
        CommitmentLevel::Finalized => 2,
    }
}

/// One entry of a `getSignatureStatuses` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Transaction error, `None` on success
    #[serde(default)]
    pub err: Option<Value>,
    /// processed | confirmed | finalized
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureStatus {
    /// Level this status has reached
    ///
    /// Nodes that omit `confirmationStatus` report rooted blocks with
    /// `confirmations: null`.
    pub fn reached_commitment(&self) -> CommitmentLevel {
        match self.confirmation_status.as_deref().and_then(parse_commitment) {
            Some(level) => level,
            None if self.confirmations.is_none() => CommitmentLevel::Finalized,
            None => CommitmentLevel::Confirmed,
        }
    }

    /// Whether the requested commitment has been reached
    pub fn satisfies(&self, commitment: CommitmentLevel) -> bool {
        commitment_rank(self.reached_commitment()) >= commitment_rank(commitment)
    }

    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }
}

/// Validate a base58 transaction signature
pub fn validate_signature(signature: &str) -> Result<Signature, ConfirmError> {
    Signature::from_str(signature.trim())
        .map_err(|_| ConfirmError::InvalidSignature(signature.to_string()))
}

/// Shorten a signature for log lines
pub fn short_signature(signature: &str) -> &str {
    match signature.char_indices().nth(12) {
        Some((idx, _)) => &signature[..idx],
        None => signature,
    }
}
