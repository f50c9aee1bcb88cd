// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use reactant_core::{Publisher, PublisherRef, ReactantError, SubscriberRef};
use reactant_runtime::SchedulerRef;
use std::fmt;
use std::time::Duration;

/// A cold sequence of at most one item followed by one terminal signal.
///
/// Every constructor and operator on `Mono` preserves the at-most-one guarantee;
/// [`Mono::flux`] widens it back into a [`Flux`].
pub struct Mono<T> {
    inner: Flux<T>,
}

impl<T: Send + 'static> Mono<T> {
    /// Wraps a publisher the caller knows emits at most one item.
    pub(crate) fn from_flux_unchecked(inner: Flux<T>) -> Self {
        Self { inner }
    }

    /// Wraps any publisher, keeping only its first item.
    pub fn from_publisher(publisher: impl Publisher<T> + 'static) -> Self {
        Flux::from_publisher(publisher).into_mono()
    }

    /// Attaches `subscriber`; it receives `on_subscribe` before anything else.
    pub fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.inner.subscribe(subscriber);
    }

    /// The publisher behind this handle.
    pub fn as_publisher(&self) -> PublisherRef<T> {
        self.inner.as_publisher()
    }

    /// This sequence as a [`Flux`] of zero or one item.
    pub fn flux(self) -> Flux<T> {
        self.inner
    }

    /// Transforms the value with `mapper`.
    pub fn map<R, F>(self, mapper: F) -> Mono<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        Mono::from_flux_unchecked(self.inner.map(mapper))
    }

    /// Transforms the value with a fallible `mapper`; an `Err` fails the sequence.
    pub fn try_map<R, F>(self, mapper: F) -> Mono<R>
    where
        R: Send + 'static,
        F: Fn(T) -> reactant_core::Result<R> + Send + Sync + 'static,
    {
        Mono::from_flux_unchecked(self.inner.try_map(mapper))
    }

    /// Completes empty when the value does not satisfy `predicate`.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.filter(predicate))
    }

    /// Maps the value to another `Mono` and emits that one's result.
    pub fn flat_map<R, F>(self, mapper: F) -> Mono<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Mono<R> + Send + Sync + 'static,
    {
        Mono::from_flux_unchecked(self.inner.concat_map(move |item| mapper(item).flux()))
    }

    /// Maps the value to a `Flux` and emits all of its items.
    pub fn flat_map_many<R, F>(self, mapper: F) -> Flux<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Flux<R> + Send + Sync + 'static,
    {
        self.inner.concat_map(mapper)
    }

    /// Combines this value with `other`'s; empty if either is empty.
    pub fn zip_with<U, R, F>(self, other: Mono<U>, combiner: F) -> Mono<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        Mono::from_flux_unchecked(self.inner.zip_with(other.inner, combiner))
    }

    /// On error, emits `fallback` and completes.
    pub fn on_error_return(self, fallback: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_flux_unchecked(self.inner.on_error_return(fallback))
    }

    /// On error, continues with the `Mono` that `fallback` builds from it.
    pub fn on_error_resume<F>(self, fallback: F) -> Self
    where
        F: Fn(ReactantError) -> Mono<T> + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.on_error_resume(move |error| fallback(error).flux()))
    }

    /// Replaces the error with the one `mapper` returns.
    pub fn on_error_map<F>(self, mapper: F) -> Self
    where
        F: Fn(ReactantError) -> ReactantError + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.on_error_map(mapper))
    }

    /// Resubscribes after an error, at most `times` times.
    pub fn retry(self, times: u64) -> Self {
        Self::from_flux_unchecked(self.inner.retry(times))
    }

    /// Subscribes to the source on `scheduler`.
    pub fn subscribe_on(self, scheduler: SchedulerRef) -> Self {
        Self::from_flux_unchecked(self.inner.subscribe_on(scheduler))
    }

    /// Delivers the result on `scheduler`.
    pub fn publish_on(self, scheduler: SchedulerRef) -> Self {
        Self::from_flux_unchecked(self.inner.publish_on_with_prefetch(scheduler, 1))
    }

    /// Fails with a timeout if no signal arrives within `duration`.
    pub fn timeout(self, duration: Duration, scheduler: SchedulerRef) -> Self {
        Self::from_flux_unchecked(self.inner.timeout(duration, scheduler))
    }

    /// Runs `hook` on the value before passing it on.
    pub fn do_on_next<F>(self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.do_on_next(hook))
    }

    /// Runs `hook` on the error before passing it on.
    pub fn do_on_error<F>(self, hook: F) -> Self
    where
        F: Fn(&ReactantError) + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.do_on_error(hook))
    }

    /// Runs `hook` when the downstream cancels.
    pub fn do_on_cancel<F>(self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(self.inner.do_on_cancel(hook))
    }

    /// Logs every signal crossing this point under `category`.
    pub fn log(self, category: impl Into<String>) -> Self
    where
        T: fmt::Debug,
    {
        Self::from_flux_unchecked(self.inner.log(category))
    }
}

impl<T> Clone for Mono<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Mono<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mono")
    }
}

impl<T: Send + 'static> Publisher<T> for Mono<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.inner.subscribe(subscriber);
    }
}
