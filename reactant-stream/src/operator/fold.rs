// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Aggregations that reduce a whole sequence to a single value.

use crate::flux::Flux;
use crate::mono::Mono;
use crate::source::scalar::ScalarEmitter;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Publisher, PublisherRef, ReactantError, Result, Subscriber, SubscriberRef,
    SubscriptionRef, UNBOUNDED,
};
use std::sync::Arc;

type Seed<A> = Arc<dyn Fn() -> Option<A> + Send + Sync>;
type Accumulate<A, T> = Arc<dyn Fn(Option<A>, T) -> Result<A> + Send + Sync>;

struct FoldPublisher<T, A> {
    source: PublisherRef<T>,
    seed: Seed<A>,
    step: Accumulate<A, T>,
}

impl<T: Send + 'static, A: Send + 'static> Publisher<A> for FoldPublisher<T, A> {
    fn subscribe(&self, subscriber: SubscriberRef<A>) {
        let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
        subscriber.on_subscribe(emitter.clone());
        if emitter.is_terminated() {
            return;
        }
        let seed = match catch_panic(|| (self.seed)()) {
            Ok(seed) => seed,
            Err(error) => {
                emitter.error(error);
                return;
            }
        };
        self.source.subscribe(Arc::new(FoldSubscriber {
            emitter,
            accumulator: Mutex::new(seed),
            step: self.step.clone(),
        }));
    }
}

/// Requests everything from upstream and folds it; the result is held until requested.
struct FoldSubscriber<T, A> {
    emitter: Arc<ScalarEmitter<A>>,
    accumulator: Mutex<Option<A>>,
    step: Accumulate<A, T>,
}

impl<T: Send + 'static, A: Send + 'static> Subscriber<T> for FoldSubscriber<T, A> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.emitter.upstream().set_once(subscription.clone()) {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&self, item: T) {
        if self.emitter.is_terminated() {
            return;
        }
        let mut accumulator = self.accumulator.lock();
        let current = accumulator.take();
        match catch_panic(|| (self.step)(current, item)).and_then(|next| next) {
            Ok(next) => *accumulator = Some(next),
            Err(error) => {
                drop(accumulator);
                self.emitter.upstream().cancel();
                self.emitter.error(error);
            }
        }
    }

    fn on_error(&self, error: ReactantError) {
        self.accumulator.lock().take();
        self.emitter.error(error);
    }

    fn on_complete(&self) {
        let result = self.accumulator.lock().take();
        match result {
            Some(value) => self.emitter.complete_with(value),
            None => self.emitter.complete_empty(),
        };
    }
}

impl<T: Send + 'static> Flux<T> {
    fn aggregate<A, S, F>(self, seed: S, step: F) -> Mono<A>
    where
        A: Send + 'static,
        S: Fn() -> Option<A> + Send + Sync + 'static,
        F: Fn(Option<A>, T) -> Result<A> + Send + Sync + 'static,
    {
        Mono::from_flux_unchecked(Flux::from_publisher(FoldPublisher {
            source: self.as_publisher(),
            seed: Arc::new(seed),
            step: Arc::new(step),
        }))
    }

    /// Folds every item into an accumulator starting from `initial`.
    pub fn fold<A, F>(self, initial: A, folder: F) -> Mono<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        self.aggregate(
            move || Some(initial.clone()),
            move |accumulator, item| match accumulator {
                Some(accumulator) => Ok(folder(accumulator, item)),
                None => Err(ReactantError::stream_error("fold accumulator missing")),
            },
        )
    }

    /// Combines items pairwise with `reducer`; empty when the sequence is empty.
    pub fn reduce<F>(self, reducer: F) -> Mono<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.aggregate(
            || None,
            move |accumulator, item| {
                Ok(match accumulator {
                    Some(accumulator) => reducer(accumulator, item),
                    None => item,
                })
            },
        )
    }

    /// Collects every item into a `Vec`, in order.
    pub fn collect_list(self) -> Mono<Vec<T>> {
        self.aggregate(
            || Some(Vec::new()),
            |accumulator, item| {
                let mut items = accumulator.unwrap_or_default();
                items.push(item);
                Ok(items)
            },
        )
    }

    /// Counts the items.
    pub fn count(self) -> Mono<u64> {
        self.aggregate(|| Some(0), |count, _| Ok(count.unwrap_or(0) + 1))
    }

    /// The last item; empty when the sequence is empty.
    pub fn last(self) -> Mono<T> {
        self.aggregate(|| None, |_, item| Ok(item))
    }

    /// The first item; the rest of the sequence is cancelled.
    #[allow(clippy::should_implement_trait)]
    pub fn next(self) -> Mono<T> {
        self.into_mono()
    }
}
