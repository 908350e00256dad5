//! Pubsub wire messages
//!
//! Outbound requests are typed structs, inbound frames are classified into
//! subscription acknowledgments, signature notifications and everything else.

use crate::constants::JSONRPC_VERSION;
use crate::rpc::commitment_to_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::commitment_config::CommitmentLevel;

/// Outbound JSON-RPC request frame
#[derive(Serialize, Debug)]
pub struct PubsubRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Vec<Value>,
}

impl PubsubRequest {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `signatureSubscribe` for one signature
pub fn signature_subscribe_request(
    id: u64,
    signature: &str,
    commitment: CommitmentLevel,
) -> PubsubRequest {
    PubsubRequest {
        jsonrpc: JSONRPC_VERSION,
        id,
        method: "signatureSubscribe",
        params: vec![
            Value::String(signature.to_string()),
            serde_json::json!({
                "commitment": commitment_to_str(commitment),
                "enableReceivedNotification": false
            }),
        ],
    }
}

/// `signatureUnsubscribe` for a provider-issued subscription id
pub fn signature_unsubscribe_request(id: u64, subscription_id: u64) -> PubsubRequest {
    PubsubRequest {
        jsonrpc: JSONRPC_VERSION,
        id,
        method: "signatureUnsubscribe",
        params: vec![Value::from(subscription_id)],
    }
}

/// Payload of a `signatureNotification`
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureNotification {
    pub subscription: u64,
    pub slot: Option<u64>,
    /// On-chain error, `None` when the transaction succeeded
    pub err: Option<Value>,
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Reply to one of our requests, `Err` carries the JSON-RPC error object
    Response {
        id: u64,
        result: Result<Value, Value>,
    },
    SignatureNotification(SignatureNotification),
    /// Integer `result` without an `id`; some providers ack subscribes this way
    BareAck(u64),
    Other,
}

#[derive(Deserialize, Debug)]
struct RawFrame {
    id: Option<u64>,
    method: Option<String>,
    result: Option<Value>,
    error: Option<Value>,
    params: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct RawNotificationParams {
    subscription: u64,
    result: Option<RawNotificationResult>,
}

#[derive(Deserialize, Debug)]
struct RawNotificationResult {
    context: Option<RawContext>,
    value: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct RawContext {
    slot: Option<u64>,
}

/// Parse one text frame
pub fn parse_inbound(text: &str) -> Result<Inbound, serde_json::Error> {
    let frame: RawFrame = serde_json::from_str(text)?;

    if frame.method.as_deref() == Some("signatureNotification") {
        let params: RawNotificationParams = match frame.params {
            Some(params) => serde_json::from_value(params)?,
            None => return Ok(Inbound::Other),
        };
        let result = params.result;
        let slot = result
            .as_ref()
            .and_then(|r| r.context.as_ref())
            .and_then(|c| c.slot);

        // Only a `value` object counts; a missing or null value must not read as success.
        // "receivedSignature" updates carry a string value and are skipped too.
        let err = match result.and_then(|r| r.value) {
            Some(Value::Object(mut value)) => match value.remove("err") {
                Some(Value::Null) | None => None,
                Some(err) => Some(err),
            },
            _ => return Ok(Inbound::Other),
        };

        return Ok(Inbound::SignatureNotification(SignatureNotification {
            subscription: params.subscription,
            slot,
            err,
        }));
    }

    match frame.id {
        Some(id) => {
            let result = match frame.error {
                Some(error) => Err(error),
                None => Ok(frame.result.unwrap_or(Value::Null)),
            };
            Ok(Inbound::Response { id, result })
        }
        None => match (frame.method, frame.error, frame.result.as_ref().and_then(Value::as_u64)) {
            (None, None, Some(subscription_id)) => Ok(Inbound::BareAck(subscription_id)),
            _ => Ok(Inbound::Other),
        },
    }
}
