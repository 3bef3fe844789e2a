//! Caller-side bookkeeping of the subscriptions registered on one handle.
//!
//! The native core owns the actual listener table; this set mirrors it so
//! that clearing or destroying also stops the caller-side workers.

use ferry_types::EventType;
use parking_lot::Mutex;

use crate::events::EventFilter;
use crate::subscriber::Subscription;

/// Subscriptions attached to one handle.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration is additive; earlier subscriptions are untouched.
    pub fn add(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }

    /// Applies `clear_listeners(types)`: each subscription's filter is
    /// narrowed, and subscriptions left with nothing are closed. Returns how
    /// many were closed.
    pub fn clear(&self, types: &[EventType]) -> usize {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        subscriptions.retain_mut(|subscription| match subscription.filter().without(types) {
            Some(remaining) => {
                subscription.set_filter(remaining);
                true
            }
            None => {
                subscription.close();
                false
            }
        });
        before - subscriptions.len()
    }

    /// Closes every subscription.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.subscriptions.lock().drain(..).collect();
        for subscription in &drained {
            subscription.close();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current filters, in registration order.
    pub fn filters(&self) -> Vec<EventFilter> {
        self.subscriptions
            .lock()
            .iter()
            .map(|subscription| subscription.filter().clone())
            .collect()
    }
}
