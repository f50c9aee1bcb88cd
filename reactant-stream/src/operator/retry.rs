// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use reactant_core::{
    Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef, Subscription,
    SubscriptionArbiter, SubscriptionRef,
};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

struct RetryPublisher<T> {
    source: PublisherRef<T>,
    times: u64,
}

impl<T: Send + 'static> Publisher<T> for RetryPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let main = Arc::new_cyclic(|this| RetrySubscriber {
            this: this.clone(),
            actual: subscriber.clone(),
            source: self.source.clone(),
            arbiter: SubscriptionArbiter::new(),
            remaining: AtomicU64::new(self.times),
            wip: AtomicUsize::new(0),
            done: AtomicBool::new(false),
        });
        subscriber.on_subscribe(main.clone());
        main.resubscribe();
    }
}

struct RetrySubscriber<T> {
    this: Weak<Self>,
    actual: SubscriberRef<T>,
    source: PublisherRef<T>,
    arbiter: SubscriptionArbiter,
    remaining: AtomicU64,
    wip: AtomicUsize,
    done: AtomicBool,
}

impl<T: Send + 'static> RetrySubscriber<T> {
    // A source that fails synchronously inside `subscribe` re-enters here; the
    // trampoline turns that recursion into another turn of the loop.
    fn resubscribe(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        loop {
            if self.arbiter.is_cancelled() {
                return;
            }
            let Some(this) = self.this.upgrade() else {
                return;
            };
            self.source.subscribe(this);
            if self.wip.fetch_sub(1, Ordering::AcqRel) == 1 {
                return;
            }
        }
    }

    fn terminate(&self, error: Option<ReactantError>) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
    }
}

impl<T: Send + 'static> Subscription for RetrySubscriber<T> {
    fn request(&self, n: u64) {
        // illegal demand is terminal; it is never retried
        if let Err(error) = self.arbiter.request_checked(n) {
            self.terminate(Some(error));
        }
    }

    fn cancel(&self) {
        self.arbiter.cancel();
    }
}

impl<T: Send + 'static> Subscriber<T> for RetrySubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        self.arbiter.set(subscription);
    }

    fn on_next(&self, item: T) {
        if self.done.load(Ordering::Acquire) {
            return;
        }
        self.arbiter.produced(1);
        self.actual.on_next(item);
    }

    fn on_error(&self, error: ReactantError) {
        self.arbiter.release();
        if self.done.load(Ordering::Acquire) {
            debug!("error after termination ignored: {}", error);
            return;
        }
        let remaining = self.remaining.load(Ordering::Acquire);
        if remaining == 0 {
            self.terminate(Some(error));
            return;
        }
        self.remaining.store(remaining - 1, Ordering::Release);
        debug!("resubscribing after error ({} retries left): {}", remaining - 1, error);
        self.resubscribe();
    }

    fn on_complete(&self) {
        self.arbiter.release();
        self.terminate(None);
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Resubscribes to this sequence after an error, at most `times` times.
    ///
    /// Every retry is a fresh subscription, so a stateful source runs again from the
    /// start; items delivered before the error are not replayed or suppressed. The error
    /// that exhausts the retries is forwarded. `request(0)` fails with `IllegalDemand`
    /// without a retry.
    pub fn retry(self, times: u64) -> Self {
        Self::from_publisher(RetryPublisher {
            source: self.as_publisher(),
            times,
        })
    }
}
