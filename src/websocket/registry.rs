//! Subscription registry
//!
//! Owned by one push connection. Holds subscribe requests awaiting their
//! acknowledgment and live subscriptions awaiting their notification. Every
//! mutation goes through a single lock, so an ack can never race a delivery
//! for the same id and a callback can fire at most once.

use super::messages::SignatureNotification;
use parking_lot::Mutex;
use solana_sdk::commitment_config::CommitmentLevel;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Invoked once with the notification for its subscription
pub type SignatureCallback = Box<dyn FnOnce(SignatureNotification) -> Result<(), String> + Send>;

/// Ack outcome handed to the waiting subscriber: subscription id or rejection reason
pub type AckReply = Result<u64, String>;

/// A live subscription
pub struct SubscriptionEntry {
    pub signature: String,
    pub commitment: CommitmentLevel,
    pub registered_at: Instant,
    pub callback: SignatureCallback,
}

struct PendingSubscribe {
    signature: String,
    commitment: CommitmentLevel,
    callback: SignatureCallback,
    reply: oneshot::Sender<AckReply>,
}

/// What happened to an acknowledgment routed through the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDelivery {
    /// Subscription registered and subscriber notified
    Delivered(u64),
    /// Node refused the subscription, subscriber notified
    Rejected,
    /// No pending request with that id
    Unknown,
    /// Subscriber gave up before the ack arrived; the remote subscription is now orphaned
    Orphaned(u64),
}

/// Read-only view of a live subscription
#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    pub id: u64,
    pub signature: String,
    pub commitment: CommitmentLevel,
    pub age: Duration,
}

#[derive(Default)]
struct RegistryState {
    subscriptions: HashMap<u64, SubscriptionEntry>,
    pending: HashMap<u64, PendingSubscribe>,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a callback under its request id until the ack arrives
    pub fn register_pending(
        &self,
        request_id: u64,
        signature: &str,
        commitment: CommitmentLevel,
        callback: SignatureCallback,
    ) -> oneshot::Receiver<AckReply> {
        let (reply, receiver) = oneshot::channel();
        self.state.lock().pending.insert(
            request_id,
            PendingSubscribe {
                signature: signature.to_string(),
                commitment,
                callback,
                reply,
            },
        );
        receiver
    }

    /// Route an acknowledgment to its pending subscribe
    ///
    /// On success the callback moves into the live map before the subscriber
    /// is woken, so a notification that immediately follows the ack finds it.
    pub fn complete_pending(&self, request_id: u64, outcome: AckReply) -> AckDelivery {
        let mut state = self.state.lock();
        let pending = match state.pending.remove(&request_id) {
            Some(pending) => pending,
            None => return AckDelivery::Unknown,
        };

        match outcome {
            Ok(subscription_id) => {
                state.subscriptions.insert(
                    subscription_id,
                    SubscriptionEntry {
                        signature: pending.signature,
                        commitment: pending.commitment,
                        registered_at: Instant::now(),
                        callback: pending.callback,
                    },
                );
                if pending.reply.send(Ok(subscription_id)).is_err() {
                    state.subscriptions.remove(&subscription_id);
                    return AckDelivery::Orphaned(subscription_id);
                }
                AckDelivery::Delivered(subscription_id)
            }
            Err(reason) => {
                let _ = pending.reply.send(Err(reason));
                AckDelivery::Rejected
            }
        }
    }

    /// Route an acknowledgment that carries no request id
    ///
    /// Request ids only grow, so the smallest pending id is the oldest
    /// subscribe still waiting.
    pub fn complete_oldest_pending(&self, outcome: AckReply) -> AckDelivery {
        let oldest = self.state.lock().pending.keys().min().copied();
        match oldest {
            Some(request_id) => self.complete_pending(request_id, outcome),
            None => AckDelivery::Unknown,
        }
    }

    /// Drop a pending subscribe; false if its ack was already routed
    pub fn cancel_pending(&self, request_id: u64) -> bool {
        self.state.lock().pending.remove(&request_id).is_some()
    }

    /// Remove a subscription for delivery
    pub fn take(&self, subscription_id: u64) -> Option<SubscriptionEntry> {
        self.state.lock().subscriptions.remove(&subscription_id)
    }

    /// Remove a subscription without delivering; false if it was not present
    pub fn remove(&self, subscription_id: u64) -> bool {
        self.take(subscription_id).is_some()
    }

    pub fn contains(&self, subscription_id: u64) -> bool {
        self.state.lock().subscriptions.contains_key(&subscription_id)
    }

    /// Drop everything without invoking callbacks
    ///
    /// Dropped pending replies and callbacks close their channels, which is
    /// how waiting callers learn the connection is gone. Returns the number of
    /// entries removed.
    pub fn purge(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.subscriptions.len() + state.pending.len();
        let subscriptions = std::mem::take(&mut state.subscriptions);
        let pending = std::mem::take(&mut state.pending);
        drop(state);
        // Callbacks may own channels whose receivers react on drop; release
        // the lock first.
        drop(subscriptions);
        drop(pending);
        removed
    }

    /// Live subscriptions
    pub fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes still waiting for their ack
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn snapshot(&self) -> Vec<SubscriptionInfo> {
        let state = self.state.lock();
        let mut infos: Vec<SubscriptionInfo> = state
            .subscriptions
            .iter()
            .map(|(id, entry)| SubscriptionInfo {
                id: *id,
                signature: entry.signature.clone(),
                commitment: entry.commitment,
                age: entry.registered_at.elapsed(),
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> SignatureCallback {
        let counter = counter.clone();
        Box::new(move |_: SignatureNotification| -> Result<(), String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn notification(subscription: u64) -> SignatureNotification {
        SignatureNotification {
            subscription,
            slot: None,
            err: None,
        }
    }

    #[test]
    fn test_ack_moves_callback_into_live_map() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let mut rx =
            registry.register_pending(1, "sig", CommitmentLevel::Confirmed, counting_callback(&fired));

        assert_eq!(registry.pending_len(), 1);
        assert_eq!(registry.complete_pending(1, Ok(42)), AckDelivery::Delivered(42));
        assert_eq!(rx.try_recv().unwrap(), Ok(42));
        assert_eq!(registry.pending_len(), 0);
        assert!(registry.contains(42));

        let entry = registry.take(42).unwrap();
        assert_eq!(entry.signature, "sig");
        (entry.callback)(notification(42)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Second take finds nothing, so the callback cannot fire twice
        assert!(registry.take(42).is_none());
    }

    #[test]
    fn test_rejected_ack_reports_reason() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let mut rx =
            registry.register_pending(2, "sig", CommitmentLevel::Processed, counting_callback(&fired));

        assert_eq!(
            registry.complete_pending(2, Err("Invalid params".to_string())),
            AckDelivery::Rejected
        );
        assert_eq!(rx.try_recv().unwrap(), Err("Invalid params".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_and_orphaned_acks() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(registry.complete_pending(99, Ok(1)), AckDelivery::Unknown);

        let fired = Arc::new(AtomicUsize::new(0));
        let rx =
            registry.register_pending(3, "sig", CommitmentLevel::Confirmed, counting_callback(&fired));
        drop(rx);
        assert_eq!(registry.complete_pending(3, Ok(7)), AckDelivery::Orphaned(7));
        assert!(!registry.contains(7));
    }

    #[test]
    fn test_ack_without_id_goes_to_oldest_pending() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        assert_eq!(registry.complete_oldest_pending(Ok(1)), AckDelivery::Unknown);

        let mut second =
            registry.register_pending(9, "b", CommitmentLevel::Confirmed, counting_callback(&fired));
        let mut first =
            registry.register_pending(4, "a", CommitmentLevel::Confirmed, counting_callback(&fired));

        assert_eq!(registry.complete_oldest_pending(Ok(30)), AckDelivery::Delivered(30));
        assert_eq!(first.try_recv().unwrap(), Ok(30));
        assert!(second.try_recv().is_err());

        assert_eq!(registry.complete_oldest_pending(Ok(31)), AckDelivery::Delivered(31));
        assert_eq!(second.try_recv().unwrap(), Ok(31));
        assert_eq!(registry.snapshot()[0].signature, "a");
        assert_eq!(registry.pending_len(), 0);
    }

    #[test]
    fn test_cancel_pending() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _rx =
            registry.register_pending(4, "sig", CommitmentLevel::Confirmed, counting_callback(&fired));
        assert!(registry.cancel_pending(4));
        assert!(!registry.cancel_pending(4));
        assert_eq!(registry.complete_pending(4, Ok(8)), AckDelivery::Unknown);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _rx =
            registry.register_pending(5, "sig", CommitmentLevel::Confirmed, counting_callback(&fired));
        registry.complete_pending(5, Ok(11));

        assert!(registry.remove(11));
        assert!(!registry.remove(11));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_purge_closes_waiters_without_firing() {
        let registry = SubscriptionRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let mut pending_rx =
            registry.register_pending(6, "a", CommitmentLevel::Confirmed, counting_callback(&fired));
        let _live_rx =
            registry.register_pending(7, "b", CommitmentLevel::Finalized, counting_callback(&fired));
        registry.complete_pending(7, Ok(21));

        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.purge(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.pending_len(), 0);
        assert!(pending_rx.try_recv().is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
