// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::SubscriptionRef;
use parking_lot::Mutex;

enum SlotState {
    Empty,
    Set(SubscriptionRef),
    Closed,
}

/// Holder for a stage's single upstream subscription.
///
/// The slot accepts exactly one subscription. Cancelling before the subscription
/// arrives cancels it on arrival, and closing after a terminal signal drops the
/// reference so that the upstream and downstream stages no longer keep each other alive.
pub struct UpstreamSlot {
    state: Mutex<SlotState>,
}

impl UpstreamSlot {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Stores `subscription` if the slot is still empty.
    ///
    /// Returns `false` (and cancels `subscription`) when the slot was already filled or
    /// closed.
    pub fn set_once(&self, subscription: SubscriptionRef) -> bool {
        let mut state = self.state.lock();
        match &*state {
            SlotState::Empty => {
                *state = SlotState::Set(subscription);
                true
            }
            SlotState::Set(_) => {
                drop(state);
                warn!("on_subscribe received twice; cancelling the duplicate subscription");
                subscription.cancel();
                false
            }
            SlotState::Closed => {
                drop(state);
                subscription.cancel();
                false
            }
        }
    }

    /// Forwards `n` to the held subscription, if any.
    pub fn request(&self, n: u64) {
        if let Some(subscription) = self.get() {
            subscription.request(n);
        }
    }

    /// Cancels the held subscription and closes the slot.
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Closed);
        if let SlotState::Set(subscription) = previous {
            subscription.cancel();
        }
    }

    /// Drops the held subscription without cancelling it.
    ///
    /// Used once the upstream has delivered its terminal signal.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Closed);
        if matches!(previous, SlotState::Set(_)) {
            debug!("upstream subscription released after terminal signal");
        }
    }

    /// Returns `true` once the slot was cancelled or closed.
    pub fn is_closed(&self) -> bool {
        matches!(&*self.state.lock(), SlotState::Closed)
    }

    /// Clones the held subscription.
    pub fn get(&self) -> Option<SubscriptionRef> {
        match &*self.state.lock() {
            SlotState::Set(subscription) => Some(subscription.clone()),
            _ => None,
        }
    }
}

impl Default for UpstreamSlot {
    fn default() -> Self {
        Self::new()
    }
}
