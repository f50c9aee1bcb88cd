// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-value sequences completed by an asynchronous computation.

use super::scalar::ScalarEmitter;
use crate::flux::Flux;
use crate::mono::Mono;
use futures::FutureExt;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, EmptySubscription, Publisher, ReactantError, Result, SubscriberRef,
};
use reactant_runtime::SchedulerRef;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

fn run_on<T, Fut>(scheduler: &SchedulerRef, subscriber: SubscriberRef<T>, future: Fut)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
    subscriber.on_subscribe(emitter.clone());
    if emitter.is_cancelled() {
        return;
    }

    let target = emitter.clone();
    let spawned = scheduler.spawn(Box::pin(async move {
        let outcome = AssertUnwindSafe(future)
            .catch_unwind()
            .await
            .map_err(ReactantError::from_panic)
            .and_then(|result| result);
        // A cancelled emitter drops the outcome
        match outcome {
            Ok(value) => {
                target.complete_with(value);
            }
            Err(error) => {
                target.error(error);
            }
        }
    }));

    match spawned {
        Ok(task) => emitter.set_on_cancel(move || task.cancel()),
        Err(error) => {
            emitter.error(error);
        }
    }
}

struct FuturePublisher<Fut> {
    future: Mutex<Option<Fut>>,
    scheduler: SchedulerRef,
}

impl<T, Fut> Publisher<T> for FuturePublisher<Fut>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let taken = self.future.lock().take();
        match taken {
            Some(future) => run_on(&self.scheduler, subscriber, future),
            None => EmptySubscription::error(&subscriber, ReactantError::MultipleSubscriptions),
        }
    }
}

struct AsyncPublisher<F> {
    factory: F,
    scheduler: SchedulerRef,
}

impl<T, F, Fut> Publisher<T> for AsyncPublisher<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        match catch_panic(&self.factory) {
            Ok(future) => run_on(&self.scheduler, subscriber, future),
            Err(error) => EmptySubscription::error(&subscriber, error),
        }
    }
}

impl<T: Send + 'static> Mono<T> {
    /// Completes with the output of `future`, driven on `scheduler`.
    ///
    /// The future exists once, so only the first subscriber receives its result; later
    /// subscribers get `on_error(MultipleSubscriptions)`. Cancelling before the future
    /// resolves aborts it at its next await point, and its result is never delivered.
    pub fn from_future<Fut>(future: Fut, scheduler: SchedulerRef) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::from_flux_unchecked(Flux::from_publisher(FuturePublisher {
            future: Mutex::new(Some(future)),
            scheduler,
        }))
    }

    /// Builds a new future with `factory` for every subscription and completes with its
    /// output, driven on `scheduler`.
    pub fn from_async<F, Fut>(factory: F, scheduler: SchedulerRef) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::from_flux_unchecked(Flux::from_publisher(AsyncPublisher { factory, scheduler }))
    }
}
