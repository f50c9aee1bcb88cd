// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use reactant_core::{
    catch_panic, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef,
    Subscription, SubscriptionArbiter, SubscriptionRef,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

type Fallback<T> = Arc<dyn Fn(ReactantError) -> Flux<T> + Send + Sync>;

struct ResumePublisher<T> {
    source: PublisherRef<T>,
    fallback: Fallback<T>,
}

impl<T: Send + 'static> Publisher<T> for ResumePublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let main = Arc::new_cyclic(|this| ResumeSubscriber {
            this: this.clone(),
            actual: subscriber.clone(),
            fallback: self.fallback.clone(),
            arbiter: SubscriptionArbiter::new(),
            switched: AtomicBool::new(false),
            done: AtomicBool::new(false),
        });
        subscriber.on_subscribe(main.clone());
        self.source.subscribe(main);
    }
}

/// Subscribes to the primary source, then once to the fallback after the first error.
///
/// The same subscriber instance serves both; the arbiter carries the downstream demand
/// that the primary left unsatisfied over to the fallback.
struct ResumeSubscriber<T> {
    this: Weak<Self>,
    actual: SubscriberRef<T>,
    fallback: Fallback<T>,
    arbiter: SubscriptionArbiter,
    switched: AtomicBool,
    done: AtomicBool,
}

impl<T: Send + 'static> ResumeSubscriber<T> {
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

impl<T: Send + 'static> Subscription for ResumeSubscriber<T> {
    fn request(&self, n: u64) {
        // reported as is; the fallback only covers upstream errors
        if let Err(error) = self.arbiter.request_checked(n) {
            self.terminate(Some(error));
        }
    }

    fn cancel(&self) {
        self.arbiter.cancel();
    }
}

impl<T: Send + 'static> Subscriber<T> for ResumeSubscriber<T> {
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
        if self.switched.swap(true, Ordering::AcqRel) {
            self.terminate(Some(error));
            return;
        }
        if self.arbiter.is_cancelled() {
            debug!("error after cancellation ignored: {}", error);
            return;
        }
        debug!("resuming with fallback after error: {}", error);
        match catch_panic(|| (self.fallback)(error)) {
            Ok(fallback) => {
                if let Some(this) = self.this.upgrade() {
                    fallback.subscribe(this);
                }
            }
            Err(panic) => self.terminate(Some(panic)),
        }
    }

    fn on_complete(&self) {
        self.arbiter.release();
        self.terminate(None);
    }
}

impl<T: Send + 'static> Flux<T> {
    /// On error, continues with the sequence built by `fallback` from that error.
    ///
    /// Only the first error is intercepted; an error from the fallback is forwarded.
    pub fn on_error_resume<F>(self, fallback: F) -> Self
    where
        F: Fn(ReactantError) -> Flux<T> + Send + Sync + 'static,
    {
        Self::from_publisher(ResumePublisher {
            source: self.as_publisher(),
            fallback: Arc::new(fallback),
        })
    }

    /// On error, emits `fallback` and completes.
    pub fn on_error_return(self, fallback: T) -> Self
    where
        T: Clone + Sync,
    {
        self.on_error_resume(move |_| Flux::just(fallback.clone()))
    }

    /// Replaces the error with the one `mapper` returns.
    pub fn on_error_map<F>(self, mapper: F) -> Self
    where
        F: Fn(ReactantError) -> ReactantError + Send + Sync + 'static,
    {
        self.on_error_resume(move |error| Flux::error(mapper(error)))
    }
}
