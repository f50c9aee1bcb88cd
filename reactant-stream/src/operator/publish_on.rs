// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Demand, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef,
    Subscription, SubscriptionRef, UpstreamSlot, DEFAULT_PREFETCH,
};
use reactant_runtime::SchedulerRef;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

struct PublishOnPublisher<T> {
    source: PublisherRef<T>,
    scheduler: SchedulerRef,
    prefetch: usize,
}

impl<T: Send + 'static> Publisher<T> for PublishOnPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let prefetch = self.prefetch.max(1);
        let main = Arc::new_cyclic(|this| PublishOn {
            this: this.clone(),
            actual: subscriber,
            scheduler: self.scheduler.clone(),
            prefetch,
            limit: (prefetch - prefetch / 4).max(1),
            upstream: UpstreamSlot::new(),
            queue: Mutex::new(VecDeque::with_capacity(prefetch)),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            consumed: AtomicUsize::new(0),
            done: AtomicBool::new(false),
            error: Mutex::new(None),
            immediate_error: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        });
        self.source.subscribe(main);
    }
}

/// Queues upstream signals and replays them to the downstream on the scheduler.
///
/// At most one drain task per subscription is in flight, so the downstream sees the
/// signals in upstream order and never concurrently. Upstream is asked for `prefetch`
/// items up front and topped up by `limit` as the drain consumes them.
struct PublishOn<T> {
    this: Weak<Self>,
    actual: SubscriberRef<T>,
    scheduler: SchedulerRef,
    prefetch: usize,
    limit: usize,
    upstream: UpstreamSlot,
    queue: Mutex<VecDeque<T>>,
    demand: Demand,
    wip: AtomicUsize,
    consumed: AtomicUsize,
    done: AtomicBool,
    error: Mutex<Option<ReactantError>>,
    // delivered ahead of anything still queued
    immediate_error: Mutex<Option<ReactantError>>,
    cancelled: AtomicBool,
    terminated: AtomicBool,
}

impl<T: Send + 'static> PublishOn<T> {
    fn schedule(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let Some(this) = self.this.upgrade() else {
            return;
        };
        if let Err(error) = self.scheduler.schedule(Box::new(move || this.run())) {
            warn!("publish_on could not schedule delivery: {}", error);
            self.cancelled.store(true, Ordering::Release);
            self.upstream.cancel();
            self.queue.lock().clear();
            self.terminate(Some(error));
        }
    }

    fn run(&self) {
        if let Err(error) = catch_panic(|| self.drain()) {
            self.upstream.cancel();
            self.queue.lock().clear();
            self.terminate(Some(error));
        }
    }

    fn drain(&self) {
        let mut missed = 1;
        loop {
            if self.drain_pass() {
                return;
            }
            let previous = self.wip.fetch_sub(missed, Ordering::AcqRel);
            missed = previous - missed;
            if missed == 0 {
                return;
            }
        }
    }

    fn drain_pass(&self) -> bool {
        let requested = self.demand.get();
        let mut emitted = 0u64;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                self.queue.lock().clear();
                return true;
            }
            let immediate = self.immediate_error.lock().take();
            if let Some(error) = immediate {
                self.queue.lock().clear();
                self.terminate(Some(error));
                return true;
            }
            let done = self.done.load(Ordering::Acquire);
            let empty = self.queue.lock().is_empty();
            if done && empty {
                let error = self.error.lock().take();
                self.terminate(error);
                return true;
            }
            if empty || emitted == requested {
                break;
            }
            let Some(item) = self.queue.lock().pop_front() else {
                break;
            };
            self.actual.on_next(item);
            emitted += 1;
            self.replenish();
        }
        if emitted > 0 {
            self.demand.produced(emitted);
        }
        false
    }

    fn replenish(&self) {
        let consumed = self.consumed.fetch_add(1, Ordering::AcqRel) + 1;
        if consumed == self.limit {
            self.consumed.store(0, Ordering::Release);
            self.upstream.request(self.limit as u64);
        }
    }

    fn terminate(&self, error: Option<ReactantError>) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
    }

    fn finish(&self, error: Option<ReactantError>) {
        if self.done.load(Ordering::Acquire) {
            if let Some(error) = error {
                warn!("error dropped after terminal signal: {}", error);
            }
            return;
        }
        if let Some(error) = error {
            *self.error.lock() = Some(error);
        }
        self.done.store(true, Ordering::Release);
        self.schedule();
    }
}

impl<T: Send + 'static> Subscriber<T> for PublishOn<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if !self.upstream.set_once(subscription.clone()) {
            return;
        }
        let Some(this) = self.this.upgrade() else {
            return;
        };
        self.actual.on_subscribe(this);
        subscription.request(self.prefetch as u64);
    }

    fn on_next(&self, item: T) {
        if self.done.load(Ordering::Acquire) || self.cancelled.load(Ordering::Acquire) {
            debug!("item dropped after terminal signal");
            return;
        }
        self.queue.lock().push_back(item);
        self.schedule();
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        self.finish(Some(error));
    }

    fn on_complete(&self) {
        self.upstream.close();
        self.finish(None);
    }
}

impl<T: Send + 'static> Subscription for PublishOn<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.upstream.cancel();
            let mut immediate = self.immediate_error.lock();
            if immediate.is_none() {
                *immediate = Some(ReactantError::illegal_demand(n));
            }
            drop(immediate);
            self.schedule();
            return;
        }
        self.demand.add(n);
        self.schedule();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.upstream.cancel();
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.queue.lock().clear();
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Delivers the signals downstream of this point on `scheduler`.
    ///
    /// Signal order is preserved. A cancellation observed by the delivery task stops
    /// delivery before the next item.
    pub fn publish_on(self, scheduler: SchedulerRef) -> Self {
        self.publish_on_with_prefetch(scheduler, DEFAULT_PREFETCH)
    }

    /// Like [`publish_on`](Self::publish_on), buffering at most `prefetch` items.
    pub fn publish_on_with_prefetch(self, scheduler: SchedulerRef, prefetch: usize) -> Self {
        Self::from_publisher(PublishOnPublisher {
            source: self.as_publisher(),
            scheduler,
            prefetch,
        })
    }
}
