//! Scripted node used by unit tests

use super::{NodeRpc, SignatureStatus, TransactionSubmitter};
use crate::errors::{ConfirmError, ConfirmResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays queued responses, then repeats `fallback` forever
pub struct StubNode {
    script: Mutex<VecDeque<ConfirmResult<Option<SignatureStatus>>>>,
    fallback: ConfirmResult<Option<SignatureStatus>>,
    submit: Mutex<Option<ConfirmResult<String>>>,
    calls: AtomicUsize,
}

impl StubNode {
    pub fn new(fallback: ConfirmResult<Option<SignatureStatus>>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            submit: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Node that reports the signature at `level` without error
    pub fn reached(level: &str) -> Self {
        Self::new(Ok(Some(status(level, None))))
    }

    /// Node that has never seen the signature
    pub fn unseen() -> Self {
        Self::new(Ok(None))
    }

    /// Node whose every call fails
    pub fn failing() -> Self {
        Self::new(Err(ConfirmError::rpc("getSignatureStatuses", "node unavailable")))
    }

    pub fn then(self, response: ConfirmResult<Option<SignatureStatus>>) -> Self {
        self.script.lock().push_back(response);
        self
    }

    pub fn with_submit(self, response: ConfirmResult<String>) -> Self {
        *self.submit.lock() = Some(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn status(level: &str, err: Option<serde_json::Value>) -> SignatureStatus {
    SignatureStatus {
        slot: 100,
        confirmations: Some(1),
        err,
        confirmation_status: Some(level.to_string()),
    }
}

#[async_trait]
impl NodeRpc for StubNode {
    async fn get_signature_status(&self, _signature: &str) -> ConfirmResult<Option<SignatureStatus>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(response) => response,
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl TransactionSubmitter for StubNode {
    async fn send_raw_transaction(&self, _tx_base64: &str) -> ConfirmResult<String> {
        self.submit
            .lock()
            .clone()
            .unwrap_or_else(|| Err(ConfirmError::rpc("sendTransaction", "not scripted")))
    }
}
