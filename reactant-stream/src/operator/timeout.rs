// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! `timeout`: the monitored sequence raced against an interval timer.
//!
//! Each item from the monitored sequence bumps a shared index and re-arms the timer
//! under the new index. Whichever side moves the index to `FINISHED` first decides the
//! outcome: the monitored side by terminating, the timer by ticking under the index that
//! is still current.

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef, Subscription,
    SubscriptionArbiter, SubscriptionRef, UpstreamSlot,
};
use reactant_runtime::SchedulerRef;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

const FINISHED: u64 = u64::MAX;

struct TimeoutPublisher<T> {
    source: PublisherRef<T>,
    duration: Duration,
    scheduler: SchedulerRef,
}

impl<T: Send + 'static> Publisher<T> for TimeoutPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let main = Arc::new_cyclic(|this| TimeoutMain {
            this: this.clone(),
            actual: subscriber.clone(),
            arbiter: SubscriptionArbiter::new(),
            index: AtomicU64::new(0),
            timer: Mutex::new(None),
            duration: self.duration,
            scheduler: self.scheduler.clone(),
        });
        subscriber.on_subscribe(main.clone());
        main.arm(0);
        self.source.subscribe(main);
    }
}

struct TimeoutMain<T> {
    this: Weak<Self>,
    actual: SubscriberRef<T>,
    arbiter: SubscriptionArbiter,
    index: AtomicU64,
    timer: Mutex<Option<Arc<TimerSubscriber<T>>>>,
    duration: Duration,
    scheduler: SchedulerRef,
}

impl<T: Send + 'static> TimeoutMain<T> {
    fn arm(&self, index: u64) {
        let Some(parent) = self.this.upgrade() else {
            return;
        };
        if self.index.load(Ordering::Acquire) != index {
            return;
        }
        let timer = Arc::new(TimerSubscriber {
            parent,
            index,
            upstream: UpstreamSlot::new(),
        });
        if let Some(previous) = self.timer.lock().replace(timer.clone()) {
            previous.upstream.cancel();
        }
        Flux::interval(self.duration, self.scheduler.clone()).subscribe(timer);
    }

    fn disarm(&self) {
        let timer = self.timer.lock().take();
        if let Some(timer) = timer {
            timer.upstream.cancel();
        }
    }

    /// Claims the outcome for the signal observed under `index`.
    fn claim(&self, index: u64) -> bool {
        self.index
            .compare_exchange(index, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn timer_fired(&self, index: u64, error: Option<ReactantError>) {
        if !self.claim(index) {
            return;
        }
        self.arbiter.cancel();
        self.disarm();
        let error = error.unwrap_or_else(|| {
            ReactantError::timeout_error(format!(
                "no signal within {:?} (after {} items)",
                self.duration, index
            ))
        });
        self.actual.on_error(error);
    }

    fn finish(&self) -> bool {
        let index = self.index.swap(FINISHED, Ordering::AcqRel);
        self.arbiter.release();
        self.disarm();
        index != FINISHED
    }
}

impl<T: Send + 'static> Subscriber<T> for TimeoutMain<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        self.arbiter.set(subscription);
    }

    fn on_next(&self, item: T) {
        let index = self.index.load(Ordering::Acquire);
        if index == FINISHED {
            return;
        }
        if self
            .index
            .compare_exchange(index, index + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("item dropped: timeout already fired");
            return;
        }
        self.arbiter.produced(1);
        self.actual.on_next(item);
        self.arm(index + 1);
    }

    fn on_error(&self, error: ReactantError) {
        if self.finish() {
            self.actual.on_error(error);
        } else {
            debug!("error after timeout ignored: {}", error);
        }
    }

    fn on_complete(&self) {
        if self.finish() {
            self.actual.on_complete();
        }
    }
}

impl<T: Send + 'static> Subscription for TimeoutMain<T> {
    fn request(&self, n: u64) {
        if let Err(error) = self.arbiter.request_checked(n) {
            if self.finish() {
                self.actual.on_error(error);
            }
        }
    }

    fn cancel(&self) {
        self.index.store(FINISHED, Ordering::Release);
        self.arbiter.cancel();
        self.disarm();
    }
}

struct TimerSubscriber<T> {
    parent: Arc<TimeoutMain<T>>,
    index: u64,
    upstream: UpstreamSlot,
}

impl<T: Send + 'static> Subscriber<u64> for TimerSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set_once(subscription.clone()) {
            subscription.request(1);
        }
    }

    fn on_next(&self, _tick: u64) {
        self.upstream.cancel();
        self.parent.timer_fired(self.index, None);
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        self.parent.timer_fired(self.index, Some(error));
    }

    fn on_complete(&self) {
        self.upstream.close();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Fails with a `Timeout` error when the first item, or any item after the previous
    /// one, takes longer than `duration` to arrive. The monitored sequence is cancelled.
    pub fn timeout(self, duration: Duration, scheduler: SchedulerRef) -> Self {
        Self::from_publisher(TimeoutPublisher {
            source: self.as_publisher(),
            duration,
            scheduler,
        })
    }
}
