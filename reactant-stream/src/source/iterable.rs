// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, demand, Demand, EmptySubscription, Publisher, ReactantError, SubscriberRef,
    Subscription,
};
use std::iter::Peekable;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Emits the items of an iterator, pulling only as many as were requested.
///
/// Completion is eager: as soon as the last item was delivered the subscriber gets
/// `on_complete`, without waiting for another request.
struct IterSubscription<I: Iterator> {
    actual: SubscriberRef<I::Item>,
    items: Mutex<Peekable<I>>,
    demand: Demand,
    wip: AtomicUsize,
    // delivered by the drain loop ahead of further items
    failure: Mutex<Option<ReactantError>>,
    cancelled: AtomicBool,
}

impl<I> IterSubscription<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn start(actual: SubscriberRef<I::Item>, items: I) {
        let mut items = items.peekable();
        let is_empty = match catch_panic(|| items.peek().is_none()) {
            Ok(is_empty) => is_empty,
            Err(error) => {
                EmptySubscription::error(&actual, error);
                return;
            }
        };
        if is_empty {
            EmptySubscription::complete(&actual);
            return;
        }

        let subscription = Arc::new(Self {
            actual: actual.clone(),
            items: Mutex::new(items),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            failure: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        });
        actual.on_subscribe(subscription);
    }

    fn next_item(&self) -> reactant_core::Result<(Option<I::Item>, bool)> {
        let mut items = self.items.lock();
        catch_panic(|| {
            let item = items.next();
            let exhausted = items.peek().is_none();
            (item, exhausted)
        })
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

    /// Returns `true` once the sequence is finished.
    fn drain_pass(&self) -> bool {
        let requested = self.demand.get();
        let mut emitted = 0u64;
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return true;
            }
            let failure = self.failure.lock().take();
            if let Some(error) = failure {
                self.finish(Some(error));
                return true;
            }
            if emitted == requested {
                break;
            }
            match self.next_item() {
                Ok((Some(item), exhausted)) => {
                    self.actual.on_next(item);
                    emitted += 1;
                    if exhausted {
                        self.finish(None);
                        return true;
                    }
                }
                Ok((None, _)) => {
                    self.finish(None);
                    return true;
                }
                Err(error) => {
                    self.finish(Some(error));
                    return true;
                }
            }
        }
        if emitted > 0 {
            self.demand.produced(emitted);
        }
        false
    }

    fn finish(&self, error: Option<ReactantError>) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
    }
}

impl<I> Subscription for IterSubscription<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn request(&self, n: u64) {
        match demand::validate(n) {
            Ok(()) => {
                self.demand.add(n);
            }
            Err(error) => {
                let mut failure = self.failure.lock();
                if failure.is_none() {
                    *failure = Some(error);
                }
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Publisher re-iterating a cloneable collection for each subscriber.
struct IterablePublisher<C> {
    items: C,
}

impl<C> Publisher<<C as IntoIterator>::Item> for IterablePublisher<C>
where
    C: IntoIterator + Clone + Send + Sync,
    C::IntoIter: Send + 'static,
    C::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: SubscriberRef<C::Item>) {
        IterSubscription::start(subscriber, self.items.clone().into_iter());
    }
}

/// Publisher handing its one iterator to the first subscriber.
struct IteratorPublisher<I> {
    items: Mutex<Option<I>>,
}

impl<I> Publisher<I::Item> for IteratorPublisher<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: SubscriberRef<I::Item>) {
        let taken = self.items.lock().take();
        match taken {
            Some(items) => IterSubscription::start(subscriber, items),
            None => EmptySubscription::error(&subscriber, ReactantError::MultipleSubscriptions),
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Emits every item of `items`, in order, respecting demand.
    ///
    /// Each subscription iterates a fresh clone of `items`.
    pub fn from_iter<C>(items: C) -> Self
    where
        C: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        C::IntoIter: Send + 'static,
    {
        Self::from_publisher(IterablePublisher { items })
    }

    /// Emits the items of a one-shot iterator.
    ///
    /// Only the first subscriber receives the items; later subscribers get
    /// `on_error(MultipleSubscriptions)`.
    pub fn from_iterator<I>(items: I) -> Self
    where
        I: Iterator<Item = T> + Send + 'static,
    {
        Self::from_publisher(IteratorPublisher {
            items: Mutex::new(Some(items)),
        })
    }

    /// Emits `item` then completes.
    pub fn just(item: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_iter(std::iter::once(item))
    }
}

impl Flux<i64> {
    /// Emits `count` consecutive integers starting at `start`.
    ///
    /// Values are produced lazily, one per unit of demand. A range whose last value
    /// would not fit in an `i64` fails instead.
    pub fn range(start: i64, count: u64) -> Self {
        if count == 0 {
            return Self::empty();
        }
        let last = i64::try_from(count - 1)
            .ok()
            .and_then(|offset| start.checked_add(offset));
        match last {
            Some(last) => Self::from_iter(start..=last),
            None => Self::error(ReactantError::stream_error(format!(
                "range({start}, {count}) overflows i64"
            ))),
        }
    }
}
