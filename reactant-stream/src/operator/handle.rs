// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One-in, at-most-one-out stages: `map`, `try_map`, `filter`, `take`, `skip`,
//! `take_while`.
//!
//! These stages keep no queue, so they hand the upstream subscription straight to the
//! downstream: `request` and `cancel` travel upstream untouched.

use crate::flux::Flux;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Publisher, PublisherRef, ReactantError, Result, Subscriber, SubscriberRef,
    SubscriptionRef, UpstreamSlot,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of handling one upstream item.
pub(crate) enum Step<R> {
    /// Forward a value.
    Emit(R),
    /// Drop the item and ask upstream for a replacement.
    Skip,
    /// Forward a value, then cancel upstream and complete.
    EmitLast(R),
    /// Cancel upstream and complete.
    Stop,
    /// Cancel upstream and fail.
    Fail(ReactantError),
}

type Handler<T, R> = Box<dyn FnMut(T) -> Step<R> + Send>;
type HandlerFactory<T, R> = Arc<dyn Fn() -> Handler<T, R> + Send + Sync>;

struct HandlePublisher<T, R> {
    source: PublisherRef<T>,
    factory: HandlerFactory<T, R>,
}

impl<T: Send + 'static, R: Send + 'static> Publisher<R> for HandlePublisher<T, R> {
    fn subscribe(&self, subscriber: SubscriberRef<R>) {
        self.source.subscribe(Arc::new(HandleSubscriber {
            actual: subscriber,
            handler: Mutex::new((self.factory)()),
            upstream: UpstreamSlot::new(),
            done: AtomicBool::new(false),
        }));
    }
}

struct HandleSubscriber<T, R> {
    actual: SubscriberRef<R>,
    handler: Mutex<Handler<T, R>>,
    upstream: UpstreamSlot,
    done: AtomicBool,
}

impl<T, R> HandleSubscriber<T, R> {
    fn finish(&self, error: Option<ReactantError>) {
        if self.done.swap(true, Ordering::AcqRel) {
            if let Some(error) = error {
                warn!("error dropped after terminal signal: {}", error);
            }
            return;
        }
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
    }
}

impl<T: Send + 'static, R: Send + 'static> Subscriber<T> for HandleSubscriber<T, R> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set_once(subscription.clone()) {
            self.actual.on_subscribe(subscription);
        }
    }

    fn on_next(&self, item: T) {
        if self.done.load(Ordering::Acquire) {
            debug!("item dropped after terminal signal");
            return;
        }
        let step = {
            let mut handler = self.handler.lock();
            catch_panic(|| (*handler)(item)).unwrap_or_else(Step::Fail)
        };
        match step {
            Step::Emit(value) => self.actual.on_next(value),
            Step::Skip => self.upstream.request(1),
            Step::EmitLast(value) => {
                self.upstream.cancel();
                self.actual.on_next(value);
                self.finish(None);
            }
            Step::Stop => {
                self.upstream.cancel();
                self.finish(None);
            }
            Step::Fail(error) => {
                self.upstream.cancel();
                self.finish(Some(error));
            }
        }
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

impl<T: Send + 'static> Flux<T> {
    /// Runs a fresh handler, built by `factory`, over each subscription's items.
    pub(crate) fn handle<R, H, F>(self, factory: F) -> Flux<R>
    where
        R: Send + 'static,
        H: FnMut(T) -> Step<R> + Send + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Flux::from_publisher(HandlePublisher {
            source: self.as_publisher(),
            factory: Arc::new(move || Box::new(factory()) as Handler<T, R>),
        })
    }

    /// Transforms every item with `mapper`.
    ///
    /// A panicking mapper cancels upstream and fails the sequence.
    pub fn map<R, F>(self, mapper: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let mapper = Arc::new(mapper);
        self.handle(move || {
            let mapper = mapper.clone();
            move |item| Step::Emit(mapper(item))
        })
    }

    /// Transforms every item with a fallible `mapper`; the first `Err` cancels upstream
    /// and fails the sequence.
    pub fn try_map<R, F>(self, mapper: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Result<R> + Send + Sync + 'static,
    {
        let mapper = Arc::new(mapper);
        self.handle(move || {
            let mapper = mapper.clone();
            move |item| match mapper(item) {
                Ok(value) => Step::Emit(value),
                Err(error) => Step::Fail(error),
            }
        })
    }

    /// Forwards only the items matching `predicate`.
    ///
    /// Every rejected item is replaced by a `request(1)` upstream, so downstream demand
    /// is always honoured.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.handle(move || {
            let predicate = predicate.clone();
            move |item| {
                if predicate(&item) {
                    Step::Emit(item)
                } else {
                    Step::Skip
                }
            }
        })
    }

    /// Forwards the first `n` items, then cancels upstream and completes.
    pub fn take(self, n: u64) -> Self {
        if n == 0 {
            return Self::empty();
        }
        self.handle(move || {
            let mut remaining = n;
            move |item| {
                remaining -= 1;
                if remaining == 0 {
                    Step::EmitLast(item)
                } else {
                    Step::Emit(item)
                }
            }
        })
    }

    /// Drops the first `n` items.
    pub fn skip(self, n: u64) -> Self {
        if n == 0 {
            return self;
        }
        self.handle(move || {
            let mut remaining = n;
            move |item| {
                if remaining > 0 {
                    remaining -= 1;
                    Step::Skip
                } else {
                    Step::Emit(item)
                }
            }
        })
    }

    /// Forwards items while `predicate` holds; the first rejected item cancels upstream
    /// and completes.
    pub fn take_while<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.handle(move || {
            let predicate = predicate.clone();
            move |item| {
                if predicate(&item) {
                    Step::Emit(item)
                } else {
                    Step::Stop
                }
            }
        })
    }
}
