// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Demand, Publisher, PublisherRef, ReactantError, Result, Subscriber,
    SubscriberRef, Subscription, SubscriptionRef, UpstreamSlot, DEFAULT_PREFETCH,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type Combiner<T, R> = Arc<dyn Fn(Vec<T>) -> Result<R> + Send + Sync>;

struct ZipPublisher<T, R> {
    sources: Vec<PublisherRef<T>>,
    combiner: Combiner<T, R>,
    prefetch: usize,
}

impl<T: Send + 'static, R: Send + 'static> Publisher<R> for ZipPublisher<T, R> {
    fn subscribe(&self, subscriber: SubscriberRef<R>) {
        let coordinator = Arc::new(ZipCoordinator {
            actual: subscriber.clone(),
            combiner: self.combiner.clone(),
            prefetch: self.prefetch,
            lanes: (0..self.sources.len()).map(|_| ZipLane::new()).collect(),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            error: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        });
        subscriber.on_subscribe(coordinator.clone());
        for (index, source) in self.sources.iter().enumerate() {
            if coordinator.cancelled.load(Ordering::Acquire)
                || coordinator.terminated.load(Ordering::Acquire)
            {
                break;
            }
            source.subscribe(Arc::new(ZipSubscriber {
                parent: coordinator.clone(),
                index,
            }));
        }
    }
}

struct ZipLane<T> {
    upstream: UpstreamSlot,
    queue: Mutex<VecDeque<T>>,
    done: AtomicBool,
    consumed: AtomicUsize,
}

impl<T> ZipLane<T> {
    fn new() -> Self {
        Self {
            upstream: UpstreamSlot::new(),
            queue: Mutex::new(VecDeque::new()),
            done: AtomicBool::new(false),
            consumed: AtomicUsize::new(0),
        }
    }

    fn exhausted(&self) -> bool {
        self.done.load(Ordering::Acquire) && self.queue.lock().is_empty()
    }
}

/// Pairs items by position across all lanes.
///
/// A row is emitted once every lane has a queued item and downstream demand allows it.
/// As soon as any lane is finished with an empty queue no further row can form, so the
/// sequence completes and the other lanes are cancelled.
struct ZipCoordinator<T, R> {
    actual: SubscriberRef<R>,
    combiner: Combiner<T, R>,
    prefetch: usize,
    lanes: Vec<ZipLane<T>>,
    demand: Demand,
    wip: AtomicUsize,
    error: Mutex<Option<ReactantError>>,
    cancelled: AtomicBool,
    terminated: AtomicBool,
}

impl<T: Send + 'static, R: Send + 'static> ZipCoordinator<T, R> {
    fn cancel_lanes(&self) {
        for lane in &self.lanes {
            lane.upstream.cancel();
            lane.queue.lock().clear();
        }
    }

    fn fail(&self, error: ReactantError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.drain();
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

    fn drain_pass(&self) -> bool {
        let requested = self.demand.get();
        let mut emitted = 0u64;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                self.cancel_lanes();
                return true;
            }
            let error = self.error.lock().take();
            if let Some(error) = error {
                self.cancel_lanes();
                self.terminate(Some(error));
                return true;
            }
            if self.lanes.is_empty() || self.lanes.iter().any(ZipLane::exhausted) {
                self.cancel_lanes();
                self.terminate(None);
                return true;
            }
            if emitted == requested {
                break;
            }
            if self.lanes.iter().any(|lane| lane.queue.lock().is_empty()) {
                break;
            }

            let row: Vec<T> = self
                .lanes
                .iter()
                .filter_map(|lane| lane.queue.lock().pop_front())
                .collect();
            for lane in &self.lanes {
                self.replenish(lane);
            }
            match catch_panic(|| (self.combiner)(row)).and_then(|combined| combined) {
                Ok(combined) => {
                    self.actual.on_next(combined);
                    emitted += 1;
                }
                Err(error) => {
                    *self.error.lock() = Some(error);
                }
            }
        }
        if emitted > 0 {
            self.demand.produced(emitted);
        }
        false
    }

    fn replenish(&self, lane: &ZipLane<T>) {
        let limit = (self.prefetch - self.prefetch / 4).max(1);
        let consumed = lane.consumed.fetch_add(1, Ordering::AcqRel) + 1;
        if consumed == limit {
            lane.consumed.store(0, Ordering::Release);
            lane.upstream.request(limit as u64);
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
}

impl<T: Send + 'static, R: Send + 'static> Subscription for ZipCoordinator<T, R> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.fail(ReactantError::illegal_demand(n));
            return;
        }
        self.demand.add(n);
        self.drain();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.drain();
        }
    }
}

struct ZipSubscriber<T, R> {
    parent: Arc<ZipCoordinator<T, R>>,
    index: usize,
}

impl<T: Send + 'static, R: Send + 'static> ZipSubscriber<T, R> {
    fn lane(&self) -> &ZipLane<T> {
        &self.parent.lanes[self.index]
    }
}

impl<T: Send + 'static, R: Send + 'static> Subscriber<T> for ZipSubscriber<T, R> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.lane().upstream.set_once(subscription.clone()) {
            subscription.request(self.parent.prefetch as u64);
        }
    }

    fn on_next(&self, item: T) {
        self.lane().queue.lock().push_back(item);
        self.parent.drain();
    }

    fn on_error(&self, error: ReactantError) {
        self.lane().upstream.close();
        self.parent.fail(error);
    }

    fn on_complete(&self) {
        let lane = self.lane();
        lane.upstream.close();
        lane.done.store(true, Ordering::Release);
        self.parent.drain();
    }
}

enum Either<A, B> {
    Left(A),
    Right(B),
}

impl<T: Send + 'static> Flux<T> {
    /// Combines the items of `sources` by position with `combiner`.
    ///
    /// Emits as many rows as the shortest source has items, then completes. An error
    /// from any source fails the result and cancels the others.
    pub fn zip<R, F>(sources: Vec<Flux<T>>, combiner: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(Vec<T>) -> R + Send + Sync + 'static,
    {
        Self::zip_inner(sources, Arc::new(move |row| Ok(combiner(row))))
    }

    fn zip_inner<R: Send + 'static>(sources: Vec<Flux<T>>, combiner: Combiner<T, R>) -> Flux<R> {
        Flux::from_publisher(ZipPublisher {
            sources: sources.iter().map(Flux::as_publisher).collect(),
            combiner,
            prefetch: DEFAULT_PREFETCH,
        })
    }

    /// Pairs this sequence's items with `other`'s by position.
    pub fn zip_with<U, R, F>(self, other: Flux<U>, combiner: F) -> Flux<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let left = self.map(Either::Left);
        let right = other.map(Either::Right);
        Flux::zip_inner(
            vec![left, right],
            Arc::new(move |row: Vec<Either<T, U>>| {
                let mut row = row.into_iter();
                match (row.next(), row.next()) {
                    (Some(Either::Left(a)), Some(Either::Right(b))) => Ok(combiner(a, b)),
                    _ => Err(ReactantError::stream_error("zip row out of position")),
                }
            }),
        )
    }
}
