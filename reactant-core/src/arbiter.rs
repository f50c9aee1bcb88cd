// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Switching between successive upstream subscriptions.

use crate::demand::{self, add_cap, UNBOUNDED};
use crate::error::Result;
use crate::protocol::{Subscription, SubscriptionRef};
use parking_lot::Mutex;

struct ArbiterState {
    current: Option<SubscriptionRef>,
    requested: u64,
    cancelled: bool,
}

/// A subscription that can be re-pointed at a new upstream while preserving demand.
///
/// The arbiter remembers how much the downstream requested and how much was already
/// produced. When a new upstream subscription is [`set`](Self::set), the outstanding
/// remainder is requested from it, so a resubscription (`retry`) or a fallback switch
/// (`on_error_resume`) neither loses nor duplicates demand. Requests that arrive before
/// the first upstream exists are held until it does (`subscribe_on`).
pub struct SubscriptionArbiter {
    state: Mutex<ArbiterState>,
}

impl SubscriptionArbiter {
    /// An arbiter with no upstream and no demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(ArbiterState {
                current: None,
                requested: 0,
                cancelled: false,
            }),
        }
    }

    /// Points the arbiter at `subscription` and requests the outstanding demand from it.
    ///
    /// The previous upstream is dropped without being cancelled; callers switch only after
    /// it terminated. If the arbiter is already cancelled, `subscription` is cancelled.
    pub fn set(&self, subscription: SubscriptionRef) {
        let mut state = self.state.lock();
        if state.cancelled {
            drop(state);
            subscription.cancel();
            return;
        }
        let previous = state.current.replace(subscription.clone());
        let outstanding = state.requested;
        drop(state);
        drop(previous);

        if outstanding > 0 {
            subscription.request(outstanding);
        }
    }

    /// Records `n` items delivered by the current upstream.
    pub fn produced(&self, n: u64) {
        let mut state = self.state.lock();
        if state.requested != UNBOUNDED {
            state.requested -= n.min(state.requested);
        }
    }

    /// Outstanding demand not yet satisfied.
    pub fn outstanding(&self) -> u64 {
        self.state.lock().requested
    }

    /// Returns `true` once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Adds `n` to the demand and forwards it to the current upstream.
    ///
    /// # Errors
    /// Returns [`ReactantError::IllegalDemand`](crate::ReactantError::IllegalDemand) when
    /// `n == 0`. The arbiter is cancelled first and nothing is forwarded; the owning stage
    /// reports the error downstream.
    pub fn request_checked(&self, n: u64) -> Result<()> {
        if let Err(error) = demand::validate(n) {
            self.cancel();
            return Err(error);
        }
        let mut state = self.state.lock();
        if state.cancelled {
            return Ok(());
        }
        state.requested = add_cap(state.requested, n);
        let current = state.current.clone();
        drop(state);

        if let Some(current) = current {
            current.request(n);
        }
        Ok(())
    }

    /// Drops the current upstream without cancelling it (after a terminal signal).
    pub fn release(&self) {
        let previous = self.state.lock().current.take();
        drop(previous);
    }
}

impl Default for SubscriptionArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription for SubscriptionArbiter {
    fn request(&self, n: u64) {
        if let Err(error) = self.request_checked(n) {
            warn!("arbiter cancelled: {}", error);
        }
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        let current = state.current.take();
        drop(state);

        if let Some(current) = current {
            current.cancel();
        }
    }
}
