// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sequence constructors.
//!
//! All sources are cold: nothing is computed until a subscriber arrives, and every
//! subscription gets its own run unless a constructor says otherwise.

pub mod create;
pub(crate) mod emitter;
pub mod future;
pub mod interval;
pub mod iterable;
pub(crate) mod scalar;

use crate::flux::Flux;
use crate::mono::Mono;
use reactant_core::{
    catch_panic, EmptySubscription, Publisher, ReactantError, Result, SubscriberRef,
};
use scalar::ScalarEmitter;
use std::marker::PhantomData;
use std::sync::Arc;

struct EmptyPublisher<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> Publisher<T> for EmptyPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        EmptySubscription::complete(&subscriber);
    }
}

struct ErrorPublisher<T> {
    error: ReactantError,
    _item: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Publisher<T> for ErrorPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        EmptySubscription::error(&subscriber, self.error.clone());
    }
}

struct NeverPublisher<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> Publisher<T> for NeverPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        subscriber.on_subscribe(Arc::new(EmptySubscription));
    }
}

struct DeferPublisher<F> {
    factory: F,
}

impl<T, F> Publisher<T> for DeferPublisher<F>
where
    T: Send + 'static,
    F: Fn() -> Flux<T> + Send + Sync,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        match catch_panic(&self.factory) {
            Ok(flux) => flux.subscribe(subscriber),
            Err(error) => EmptySubscription::error(&subscriber, error),
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Completes immediately without emitting.
    pub fn empty() -> Self {
        Self::from_publisher(EmptyPublisher(PhantomData))
    }

    /// Fails immediately with `error`.
    pub fn error(error: ReactantError) -> Self {
        Self::from_publisher(ErrorPublisher {
            error,
            _item: PhantomData,
        })
    }

    /// Never signals anything after `on_subscribe`.
    pub fn never() -> Self {
        Self::from_publisher(NeverPublisher(PhantomData))
    }

    /// Calls `factory` once per subscription and subscribes to the sequence it returns.
    ///
    /// Nothing is shared between subscriptions: side effects in `factory` run again for
    /// every subscriber. A panicking factory fails that subscription.
    pub fn defer<F>(factory: F) -> Self
    where
        F: Fn() -> Flux<T> + Send + Sync + 'static,
    {
        Self::from_publisher(DeferPublisher { factory })
    }
}

struct JustPublisher<T> {
    value: T,
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for JustPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
        subscriber.on_subscribe(emitter.clone());
        emitter.complete_with(self.value.clone());
    }
}

struct CallablePublisher<F> {
    callable: F,
}

impl<T, F> Publisher<T> for CallablePublisher<F>
where
    T: Send + 'static,
    F: Fn() -> Result<Option<T>> + Send + Sync,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
        subscriber.on_subscribe(emitter.clone());
        if emitter.is_cancelled() {
            return;
        }
        match catch_panic(&self.callable).and_then(|produced| produced) {
            Ok(Some(value)) => {
                emitter.complete_with(value);
            }
            Ok(None) => {
                emitter.complete_empty();
            }
            Err(error) => {
                emitter.error(error);
            }
        }
    }
}

impl<T: Send + 'static> Mono<T> {
    /// Emits `value` then completes.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_flux_unchecked(Flux::from_publisher(JustPublisher { value }))
    }

    /// Emits `value` if present, otherwise completes empty.
    pub fn just_or_empty(value: Option<T>) -> Self
    where
        T: Clone + Sync,
    {
        match value {
            Some(value) => Self::just(value),
            None => Self::empty(),
        }
    }

    /// Completes immediately without a value.
    pub fn empty() -> Self {
        Self::from_flux_unchecked(Flux::empty())
    }

    /// Fails immediately with `error`.
    pub fn error(error: ReactantError) -> Self {
        Self::from_flux_unchecked(Flux::error(error))
    }

    /// Never signals anything after `on_subscribe`.
    pub fn never() -> Self {
        Self::from_flux_unchecked(Flux::never())
    }

    /// Calls `factory` once per subscription and subscribes to the `Mono` it returns.
    pub fn defer<F>(factory: F) -> Self
    where
        F: Fn() -> Mono<T> + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(Flux::defer(move || factory().flux()))
    }

    /// Runs `callable` once per subscription; `Ok(None)` completes empty.
    pub fn from_callable<F>(callable: F) -> Self
    where
        F: Fn() -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(Flux::from_publisher(CallablePublisher { callable }))
    }
}
