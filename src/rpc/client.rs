//! HTTP JSON-RPC client for the node
//!
//! A thin reqwest wrapper exposing the three calls the confirmation core
//! needs: signature status lookups, raw transaction submission and health.

use super::types::SignatureStatus;
use super::{NodeRpc, TransactionSubmitter};
use crate::constants::JSONRPC_VERSION;
use crate::errors::{ConfirmError, ConfirmResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Node RPC client bound to one HTTP endpoint
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str, request_timeout: Duration) -> ConfirmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ConfirmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a client from the `[rpc]` config section
    pub fn from_config() -> ConfirmResult<Self> {
        let (url, timeout_secs) =
            crate::config::with_config(|cfg| (cfg.rpc.url.clone(), cfg.rpc.request_timeout_secs));
        Self::new(&url, Duration::from_secs(timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute one JSON-RPC call and return its `result` field
    pub async fn execute_raw(&self, method: &str, params: Value) -> ConfirmResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut payload = serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method
        });
        if !params.is_null() {
            payload["params"] = params;
        }

        logger::verbose(LogTag::Rpc, &format!("-> {} (id={})", method, id));

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfirmError::rpc(method, format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ConfirmError::rpc(method, format!("Invalid JSON response: {}", e)))?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.to_string());
            logger::debug(LogTag::Rpc, &format!("{} returned error: {}", method, message));
            return Err(ConfirmError::rpc(method, message));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| ConfirmError::rpc(method, "Response missing result"))
    }

    /// `getSignatureStatuses` for a batch of signatures, order preserved
    pub async fn get_signature_statuses(
        &self,
        signatures: &[&str],
    ) -> ConfirmResult<Vec<Option<SignatureStatus>>> {
        let params = serde_json::json!([
            signatures,
            { "searchTransactionHistory": false }
        ]);

        let result = self.execute_raw("getSignatureStatuses", params).await?;
        let values = result
            .get("value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ConfirmError::rpc("getSignatureStatuses", "Missing value array"))?;

        values
            .iter()
            .map(|entry| {
                if entry.is_null() {
                    Ok(None)
                } else {
                    serde_json::from_value(entry.clone()).map(Some).map_err(|e| {
                        ConfirmError::rpc(
                            "getSignatureStatuses",
                            format!("Invalid status entry: {}", e),
                        )
                    })
                }
            })
            .collect()
    }

    /// Submit an already signed, base64-encoded transaction
    pub async fn send_raw_transaction(&self, tx_base64: &str) -> ConfirmResult<String> {
        let params = serde_json::json!([
            tx_base64,
            {
                "encoding": "base64",
                "skipPreflight": false,
                "preflightCommitment": "confirmed",
                "maxRetries": 3
            }
        ]);

        let result = self.execute_raw("sendTransaction", params).await?;
        let signature = result
            .as_str()
            .ok_or_else(|| ConfirmError::rpc("sendTransaction", "Invalid signature response"))?;

        super::types::validate_signature(signature)?;
        Ok(signature.to_string())
    }

    /// `getHealth`, Ok only when the node answers "ok"
    pub async fn get_health(&self) -> ConfirmResult<()> {
        let result = self.execute_raw("getHealth", Value::Null).await?;
        match result.as_str() {
            Some("ok") => Ok(()),
            _ => Err(ConfirmError::rpc("getHealth", format!("Unhealthy: {}", result))),
        }
    }
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn get_signature_status(&self, signature: &str) -> ConfirmResult<Option<SignatureStatus>> {
        let mut statuses = self.get_signature_statuses(&[signature]).await?;
        Ok(statuses.pop().flatten())
    }
}

#[async_trait]
impl TransactionSubmitter for RpcClient {
    async fn send_raw_transaction(&self, tx_base64: &str) -> ConfirmResult<String> {
        RpcClient::send_raw_transaction(self, tx_base64).await
    }
}
