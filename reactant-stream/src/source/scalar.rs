// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use reactant_core::{catch_panic, ReactantError, SubscriberRef, Subscription, UpstreamSlot};

type CancelHook = Box<dyn FnOnce() + Send>;

struct ScalarState<T> {
    requested: bool,
    value: Option<T>,
    terminated: bool,
    cancelled: bool,
    on_cancel: Option<CancelHook>,
}

/// Delivers at most one value once both the value and the first request exist.
///
/// The value may be produced before or after downstream requests it, from any thread.
/// Whichever side arrives second performs the delivery. Every single-value source and
/// every aggregating operator ends in one of these.
pub(crate) struct ScalarEmitter<T> {
    actual: SubscriberRef<T>,
    state: Mutex<ScalarState<T>>,
    upstream: UpstreamSlot,
}

impl<T: Send + 'static> ScalarEmitter<T> {
    pub(crate) fn new(actual: SubscriberRef<T>) -> Self {
        Self {
            actual,
            state: Mutex::new(ScalarState {
                requested: false,
                value: None,
                terminated: false,
                cancelled: false,
                on_cancel: None,
            }),
            upstream: UpstreamSlot::new(),
        }
    }

    /// Upstream feeding this emitter; cancelled together with it.
    pub(crate) fn upstream(&self) -> &UpstreamSlot {
        &self.upstream
    }

    /// Registers work to run if downstream cancels before the value is delivered.
    ///
    /// Runs immediately when already cancelled.
    pub(crate) fn set_on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        let mut state = self.state.lock();
        if state.cancelled {
            drop(state);
            hook();
            return;
        }
        if !state.terminated {
            state.on_cancel = Some(Box::new(hook));
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub(crate) fn is_terminated(&self) -> bool {
        let state = self.state.lock();
        state.terminated || state.cancelled
    }

    /// Completes with `value`, now or on the first request.
    ///
    /// Returns `false` when the emitter had already terminated or was cancelled.
    pub(crate) fn complete_with(&self, value: T) -> bool {
        let mut state = self.state.lock();
        if state.terminated || state.cancelled {
            debug!("value dropped: single-value sequence already finished");
            return false;
        }
        if !state.requested {
            state.value = Some(value);
            return true;
        }
        state.terminated = true;
        state.on_cancel = None;
        drop(state);
        self.upstream.close();
        self.deliver(value);
        true
    }

    /// Completes without a value.
    pub(crate) fn complete_empty(&self) -> bool {
        let mut state = self.state.lock();
        if state.terminated || state.cancelled || state.value.is_some() {
            return false;
        }
        state.terminated = true;
        state.on_cancel = None;
        drop(state);
        self.upstream.close();
        self.actual.on_complete();
        true
    }

    /// Fails, regardless of demand.
    pub(crate) fn error(&self, error: ReactantError) -> bool {
        let mut state = self.state.lock();
        if state.terminated || state.cancelled {
            warn!("error dropped after single-value sequence finished: {}", error);
            return false;
        }
        state.terminated = true;
        state.value = None;
        state.on_cancel = None;
        drop(state);
        self.upstream.close();
        self.actual.on_error(error);
        true
    }

    fn deliver(&self, value: T) {
        // already marked terminated, so a failing on_next is reported here
        if let Err(error) = catch_panic(|| self.actual.on_next(value)) {
            warn!("subscriber panicked in on_next: {}", error);
            self.actual.on_error(error);
            return;
        }
        if !self.state.lock().cancelled {
            self.actual.on_complete();
        }
    }
}

impl<T: Send + 'static> Subscription for ScalarEmitter<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.upstream.cancel();
            self.error(ReactantError::illegal_demand(n));
            return;
        }
        let mut state = self.state.lock();
        if state.requested || state.cancelled {
            return;
        }
        state.requested = true;
        let Some(value) = state.value.take() else {
            return;
        };
        state.terminated = true;
        state.on_cancel = None;
        drop(state);
        self.upstream.close();
        self.deliver(value);
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if state.cancelled || state.terminated {
            state.cancelled = true;
            return;
        }
        state.cancelled = true;
        state.value = None;
        let hook = state.on_cancel.take();
        drop(state);
        self.upstream.cancel();
        if let Some(hook) = hook {
            hook();
        }
    }
}
