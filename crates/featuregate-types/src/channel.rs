//! Latest-value state channel.
//!
//! A [`StateChannel`] owns the current value of a piece of state and notifies
//! subscribers when it changes. New subscribers receive the value in effect
//! at subscription time as their first notification. Notifications coalesce:
//! a subscriber that falls behind sees only the newest value, so each
//! subscriber holds at most one pending notification.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Subscription identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub uuid::Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Channel holding the latest value of some state.
pub struct StateChannel<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateChannel<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StateChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateChannel")
            .field("latest", &*self.sender.borrow())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> StateChannel<T> {
    /// Create a channel seeded with an initial value.
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Current value.
    pub fn latest(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Replace the current value and notify every subscriber.
    ///
    /// Every publish notifies, even when the value is unchanged. Returns the
    /// number of live subscribers.
    pub fn publish(&self, value: T) -> usize {
        self.sender.send_replace(value);
        self.sender.receiver_count()
    }

    /// Subscribe to changes. The current value is delivered first.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            id: SubscriptionId::new(),
            receiver: Some(self.sender.subscribe()),
            replay: true,
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Handle to a channel subscription.
///
/// Dropping the handle unsubscribes.
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: Option<watch::Receiver<T>>,
    // Set until the value in effect at subscription time has been taken.
    replay: bool,
}

impl<T: Clone> Subscription<T> {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Wait for the next notification.
    ///
    /// Returns `None` once unsubscribed or when the channel is gone.
    pub async fn recv(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;
        if std::mem::take(&mut self.replay) {
            return Some(receiver.borrow_and_update().clone());
        }
        receiver.changed().await.ok()?;
        Some(receiver.borrow_and_update().clone())
    }

    /// Take a pending notification without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;
        let pending = std::mem::take(&mut self.replay) || receiver.has_changed().unwrap_or(false);
        pending.then(|| receiver.borrow_and_update().clone())
    }

    /// Take the most recent pending notification. Equivalent to
    /// [`try_recv`](Self::try_recv) since notifications coalesce.
    pub fn latest_pending(&mut self) -> Option<T> {
        self.try_recv()
    }

    /// Stop receiving notifications. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        self.receiver = None;
        self.replay = false;
    }
}
