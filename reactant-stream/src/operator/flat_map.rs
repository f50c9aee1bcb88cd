// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! `flat_map` and the combinators built on it: `concat_map`, `merge`, `concat`.
//!
//! Each upstream item is mapped to an inner sequence. Inner sequences prefetch into
//! their own queue, and one drain loop moves queued items downstream within the
//! downstream's demand. At most `max_concurrency` inner sequences are active; a finished
//! one is replaced by requesting one more upstream item.

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Demand, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef,
    Subscription, SubscriptionRef, UpstreamSlot, DEFAULT_PREFETCH,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Default bound on simultaneously active inner sequences.
pub const DEFAULT_CONCURRENCY: usize = 256;

type Mapper<T, R> = Arc<dyn Fn(T) -> Flux<R> + Send + Sync>;

struct FlatMapPublisher<T, R> {
    source: PublisherRef<T>,
    mapper: Mapper<T, R>,
    max_concurrency: usize,
    prefetch: usize,
    delay_errors: bool,
}

impl<T: Send + 'static, R: Send + 'static> Publisher<R> for FlatMapPublisher<T, R> {
    fn subscribe(&self, subscriber: SubscriberRef<R>) {
        let main = Arc::new_cyclic(|this| FlatMapMain {
            this: this.clone(),
            actual: subscriber.clone(),
            mapper: self.mapper.clone(),
            max_concurrency: self.max_concurrency,
            prefetch: self.prefetch,
            delay_errors: self.delay_errors,
            upstream: UpstreamSlot::new(),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            inners: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            main_done: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        });
        subscriber.on_subscribe(main.clone());
        self.source.subscribe(main);
    }
}

struct FlatMapMain<T, R> {
    this: Weak<Self>,
    actual: SubscriberRef<R>,
    mapper: Mapper<T, R>,
    max_concurrency: usize,
    prefetch: usize,
    delay_errors: bool,
    upstream: UpstreamSlot,
    demand: Demand,
    wip: AtomicUsize,
    inners: Mutex<Vec<Arc<FlatMapInner<T, R>>>>,
    errors: Mutex<Vec<ReactantError>>,
    main_done: AtomicBool,
    cancelled: AtomicBool,
    terminated: AtomicBool,
}

struct FlatMapInner<T, R> {
    parent: Arc<FlatMapMain<T, R>>,
    upstream: UpstreamSlot,
    queue: Mutex<VecDeque<R>>,
    done: AtomicBool,
    consumed: AtomicUsize,
}

impl<T: Send + 'static, R: Send + 'static> FlatMapMain<T, R> {
    fn record_error(&self, error: ReactantError) {
        self.errors.lock().push(error);
    }

    fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    fn cancel_inners(&self) {
        let inners = std::mem::take(&mut *self.inners.lock());
        for inner in inners {
            inner.upstream.cancel();
            inner.queue.lock().clear();
        }
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
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

    /// Stops everything on cancellation, or on the first error unless errors are
    /// delayed. Returns `true` once terminated.
    fn check_terminated(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            self.cancel_inners();
            return true;
        }
        if !self.delay_errors && self.has_errors() {
            self.upstream.cancel();
            self.cancel_inners();
            let errors = std::mem::take(&mut *self.errors.lock());
            self.terminate(Some(ReactantError::from_errors(errors)));
            return true;
        }
        false
    }

    /// One sweep over the active inners. Returns `true` once terminated.
    fn drain_pass(&self) -> bool {
        if self.check_terminated() {
            return true;
        }

        let snapshot = self.inners.lock().clone();
        let requested = self.demand.get();
        let mut emitted = 0u64;
        let mut replenish = 0u64;

        for inner in &snapshot {
            loop {
                if self.check_terminated() {
                    return true;
                }
                if emitted == requested {
                    break;
                }
                let item = inner.queue.lock().pop_front();
                let Some(item) = item else {
                    break;
                };
                self.actual.on_next(item);
                emitted += 1;
                inner.replenish(self.prefetch);
            }

            if inner.done.load(Ordering::Acquire) && inner.queue.lock().is_empty() {
                self.inners.lock().retain(|active| !Arc::ptr_eq(active, inner));
                inner.upstream.close();
                replenish += 1;
            }
        }

        if emitted > 0 {
            self.demand.produced(emitted);
        }

        let main_done = self.main_done.load(Ordering::Acquire);
        if main_done && self.inners.lock().is_empty() {
            let errors = std::mem::take(&mut *self.errors.lock());
            let error = (!errors.is_empty()).then(|| ReactantError::from_errors(errors));
            self.terminate(error);
            return true;
        }
        if replenish > 0 && !main_done {
            self.upstream.request(replenish);
        }
        false
    }

    fn terminate(&self, error: Option<ReactantError>) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.upstream.close();
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
    }
}

impl<T: Send + 'static, R: Send + 'static> FlatMapInner<T, R> {
    fn replenish(&self, prefetch: usize) {
        let limit = (prefetch - prefetch / 4).max(1);
        let consumed = self.consumed.fetch_add(1, Ordering::AcqRel) + 1;
        if consumed == limit {
            self.consumed.store(0, Ordering::Release);
            self.upstream.request(limit as u64);
        }
    }
}

impl<T: Send + 'static, R: Send + 'static> Subscriber<T> for FlatMapMain<T, R> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set_once(subscription.clone()) {
            subscription.request(self.max_concurrency as u64);
        }
    }

    fn on_next(&self, item: T) {
        if self.main_done.load(Ordering::Acquire) || self.cancelled.load(Ordering::Acquire) {
            return;
        }
        let Some(parent) = self.this.upgrade() else {
            return;
        };
        let inner_source = match catch_panic(|| (self.mapper)(item)) {
            Ok(inner_source) => inner_source,
            Err(error) => {
                self.upstream.cancel();
                self.record_error(error);
                self.main_done.store(true, Ordering::Release);
                self.drain();
                return;
            }
        };
        let inner = Arc::new(FlatMapInner {
            parent,
            upstream: UpstreamSlot::new(),
            queue: Mutex::new(VecDeque::new()),
            done: AtomicBool::new(false),
            consumed: AtomicUsize::new(0),
        });
        self.inners.lock().push(inner.clone());
        inner_source.subscribe(Arc::new(InnerSubscriber(inner)));
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        self.record_error(error);
        self.main_done.store(true, Ordering::Release);
        self.drain();
    }

    fn on_complete(&self) {
        self.upstream.close();
        self.main_done.store(true, Ordering::Release);
        self.drain();
    }
}

impl<T: Send + 'static, R: Send + 'static> Subscription for FlatMapMain<T, R> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.record_error(ReactantError::illegal_demand(n));
            self.upstream.cancel();
            self.main_done.store(true, Ordering::Release);
            self.cancel_inners();
            self.drain();
            return;
        }
        self.demand.add(n);
        self.drain();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.upstream.cancel();
        self.drain();
    }
}

struct InnerSubscriber<T, R>(Arc<FlatMapInner<T, R>>);

impl<T: Send + 'static, R: Send + 'static> Subscriber<R> for InnerSubscriber<T, R> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        let inner = &self.0;
        if inner.upstream.set_once(subscription.clone()) {
            subscription.request(inner.parent.prefetch as u64);
        }
    }

    fn on_next(&self, item: R) {
        let inner = &self.0;
        if inner.done.load(Ordering::Acquire) {
            return;
        }
        inner.queue.lock().push_back(item);
        inner.parent.drain();
    }

    fn on_error(&self, error: ReactantError) {
        let inner = &self.0;
        inner.parent.record_error(error);
        inner.done.store(true, Ordering::Release);
        inner.parent.drain();
    }

    fn on_complete(&self) {
        let inner = &self.0;
        inner.done.store(true, Ordering::Release);
        inner.parent.drain();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Maps every item to an inner sequence and merges their items as they arrive.
    ///
    /// At most [`DEFAULT_CONCURRENCY`] inner sequences are subscribed at once. The first
    /// error from upstream or any inner sequence cancels everything else and is
    /// forwarded immediately.
    pub fn flat_map<R, F>(self, mapper: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Flux<R> + Send + Sync + 'static,
    {
        self.flat_map_with(mapper, DEFAULT_CONCURRENCY, DEFAULT_PREFETCH)
    }

    /// [`flat_map`](Self::flat_map) with explicit concurrency and per-inner prefetch.
    pub fn flat_map_with<R, F>(self, mapper: F, max_concurrency: usize, prefetch: usize) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Flux<R> + Send + Sync + 'static,
    {
        self.flat_map_inner(Arc::new(mapper), max_concurrency, prefetch, false)
    }

    /// Like [`flat_map`](Self::flat_map), but errors are collected and reported once
    /// every sequence has finished. Several errors are reported as
    /// `ReactantError::Multiple`.
    pub fn flat_map_delay_error<R, F>(self, mapper: F, max_concurrency: usize) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Flux<R> + Send + Sync + 'static,
    {
        self.flat_map_inner(Arc::new(mapper), max_concurrency, DEFAULT_PREFETCH, true)
    }

    /// Maps every item to an inner sequence and emits them one after another, in order.
    pub fn concat_map<R, F>(self, mapper: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Flux<R> + Send + Sync + 'static,
    {
        self.flat_map_inner(Arc::new(mapper), 1, DEFAULT_PREFETCH, false)
    }

    fn flat_map_inner<R: Send + 'static>(
        self,
        mapper: Mapper<T, R>,
        max_concurrency: usize,
        prefetch: usize,
        delay_errors: bool,
    ) -> Flux<R> {
        Flux::from_publisher(FlatMapPublisher {
            source: self.as_publisher(),
            mapper,
            max_concurrency: max_concurrency.max(1),
            prefetch: prefetch.max(1),
            delay_errors,
        })
    }

    /// Interleaves the items of all `sources` as they arrive.
    ///
    /// Completes once every source completed; the first error cancels the others.
    pub fn merge(sources: Vec<Flux<T>>) -> Self {
        let concurrency = sources.len();
        Flux::from_iter(sources).flat_map_with(|source| source, concurrency, DEFAULT_PREFETCH)
    }

    /// Interleaves this sequence with `other`.
    pub fn merge_with(self, other: Flux<T>) -> Self {
        Self::merge(vec![self, other])
    }

    /// Emits all items of each source in turn, subscribing to the next one only after the
    /// previous completed.
    pub fn concat(sources: Vec<Flux<T>>) -> Self {
        Flux::from_iter(sources).concat_map(|source| source)
    }
}
