// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use reactant_core::{
    catch_panic, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef,
    Subscription, SubscriptionArbiter, SubscriptionRef,
};
use reactant_runtime::SchedulerRef;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct SubscribeOnPublisher<T> {
    source: PublisherRef<T>,
    scheduler: SchedulerRef,
}

impl<T: Send + 'static> Publisher<T> for SubscribeOnPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let arbiter = Arc::new(SubscriptionArbiter::new());
        let main = Arc::new(SubscribeOnSubscriber {
            actual: subscriber.clone(),
            arbiter: arbiter.clone(),
            done: AtomicBool::new(false),
        });
        subscriber.on_subscribe(main.clone());

        let source = self.source.clone();
        let task = main.clone();
        let scheduled = self.scheduler.schedule(Box::new(move || {
            if arbiter.is_cancelled() {
                return;
            }
            let upstream: SubscriberRef<T> = task.clone();
            if let Err(error) = catch_panic(|| source.subscribe(upstream)) {
                arbiter.cancel();
                task.finish(error);
            }
        }));
        if let Err(error) = scheduled {
            warn!("subscribe_on could not schedule the subscription: {}", error);
            main.finish(error);
        }
    }
}

struct SubscribeOnSubscriber<T> {
    actual: SubscriberRef<T>,
    arbiter: Arc<SubscriptionArbiter>,
    done: AtomicBool,
}

impl<T> SubscribeOnSubscriber<T> {
    fn finish(&self, error: ReactantError) {
        if self.done.swap(true, Ordering::AcqRel) {
            warn!("error dropped after terminal signal: {}", error);
            return;
        }
        self.actual.on_error(error);
    }
}

impl<T: Send + 'static> Subscription for SubscribeOnSubscriber<T> {
    fn request(&self, n: u64) {
        if let Err(error) = self.arbiter.request_checked(n) {
            self.finish(error);
        }
    }

    fn cancel(&self) {
        self.arbiter.cancel();
    }
}

impl<T: Send + 'static> Subscriber<T> for SubscribeOnSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        self.arbiter.set(subscription);
    }

    fn on_next(&self, item: T) {
        if !self.done.load(Ordering::Acquire) {
            self.actual.on_next(item);
        }
    }

    fn on_error(&self, error: ReactantError) {
        self.arbiter.release();
        self.finish(error);
    }

    fn on_complete(&self) {
        self.arbiter.release();
        if !self.done.swap(true, Ordering::AcqRel) {
            self.actual.on_complete();
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Performs the subscription to this sequence, and therefore its initial work, on
    /// `scheduler`.
    ///
    /// Requests made before the subscription happens are held and forwarded once it does;
    /// `request(0)` fails the sequence with `IllegalDemand` at once. A panic while subscribing, or a scheduler that rejects the work, fails the sequence.
    pub fn subscribe_on(self, scheduler: SchedulerRef) -> Self {
        Self::from_publisher(SubscribeOnPublisher {
            source: self.as_publisher(),
            scheduler,
        })
    }
}
