//! Snapshot fan-out to dynamic subscribers.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tallybar_core::UsageSnapshot;
use tokio::sync::mpsc;
use tracing::debug;

// ============================================================================
// Subscription Hub
// ============================================================================

/// Registry of live snapshot subscribers.
///
/// Each subscriber gets its own unbounded channel, so a slow consumer never
/// blocks the publisher or other consumers, and no published value is
/// dropped for a live subscriber. Disconnected subscribers are swept out
/// during the next publish. The hub is owned by the aggregator's serialized
/// state and needs no locking of its own.
#[derive(Debug, Default)]
pub struct SubscriptionHub {
    subscribers: HashMap<u64, mpsc::UnboundedSender<UsageSnapshot>>,
    next_id: u64,
}

impl SubscriptionHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and delivers `current` immediately.
    ///
    /// Late subscribers always observe the latest snapshot as their first
    /// value, even before any refresh has completed (the empty snapshot).
    pub fn attach(&mut self, current: UsageSnapshot) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        // Cannot fail: the receiver is still in hand.
        let _ = tx.send(current);
        self.subscribers.insert(id, tx);

        debug!(subscription_id = id, "subscriber attached");
        Subscription { id, rx }
    }

    /// Pushes a snapshot to every live subscriber.
    ///
    /// Subscribers whose receiver has been dropped are removed without
    /// error.
    pub fn publish(&mut self, snapshot: &UsageSnapshot) {
        self.subscribers.retain(|id, tx| {
            if tx.send(snapshot.clone()).is_ok() {
                true
            } else {
                debug!(subscription_id = *id, "subscriber disconnected");
                false
            }
        });
    }

    /// Number of registered subscribers (including not-yet-swept ones).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A live, independent stream of snapshots.
///
/// The first value is the snapshot current at subscription time; every
/// later publish follows in order. The stream ends only when the aggregator
/// is dropped; dropping the subscription disconnects it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<UsageSnapshot>,
}

impl Subscription {
    /// The unique id of this subscription.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the publishing side is gone.
    pub async fn next(&mut self) -> Option<UsageSnapshot> {
        self.rx.recv().await
    }

    /// Returns an already-delivered snapshot without waiting, if any.
    pub fn try_next(&mut self) -> Option<UsageSnapshot> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = UsageSnapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

// ============================================================================
// Tests
// ============================================================================
