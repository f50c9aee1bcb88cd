// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Push-based sources bridging callback or multi-threaded producers into a sequence.

use super::emitter::BufferedEmitter;
use super::scalar::ScalarEmitter;
use crate::backpressure::OverflowStrategy;
use crate::flux::Flux;
use crate::mono::Mono;
use reactant_core::{catch_panic, Publisher, ReactantError, Result, SubscriberRef};
use std::sync::Arc;

/// Producer-side handle of [`Flux::create`].
///
/// Cloneable and usable from any thread. Calls from concurrent producers are queued and
/// delivered to the subscriber one at a time, within its demand.
pub struct FluxSink<T> {
    emitter: Arc<BufferedEmitter<T>>,
}

impl<T: Send + 'static> FluxSink<T> {
    /// Pushes one item.
    ///
    /// # Errors
    /// Returns `SignalAfterTerminal` once `error` or `complete` was called.
    pub fn next(&self, item: T) -> Result<()> {
        self.emitter.next(item)
    }

    /// Terminates the sequence with `error` after the queued items.
    ///
    /// # Errors
    /// Returns `SignalAfterTerminal` if the sink already terminated.
    pub fn error(&self, error: ReactantError) -> Result<()> {
        self.emitter.error(error)
    }

    /// Completes the sequence after the queued items.
    ///
    /// # Errors
    /// Returns `SignalAfterTerminal` if the sink already terminated.
    pub fn complete(&self) -> Result<()> {
        self.emitter.complete()
    }

    /// Outstanding demand of the subscriber.
    pub fn requested_from_downstream(&self) -> u64 {
        self.emitter.requested()
    }

    /// Returns `true` once the subscriber cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.emitter.is_cancelled()
    }

    /// Called with every `request(n)` the subscriber makes.
    pub fn on_request(&self, hook: impl Fn(u64) + Send + Sync + 'static) -> &Self {
        self.emitter.set_on_request(Box::new(hook));
        self
    }

    /// Called once if the subscriber cancels.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) -> &Self {
        self.emitter.set_on_cancel(Box::new(hook));
        self
    }

    /// Called once after the sequence terminated or was cancelled.
    pub fn on_dispose(&self, hook: impl FnOnce() + Send + 'static) -> &Self {
        self.emitter.set_on_dispose(Box::new(hook));
        self
    }
}

impl<T> Clone for FluxSink<T> {
    fn clone(&self) -> Self {
        Self {
            emitter: self.emitter.clone(),
        }
    }
}

struct CreatePublisher<F> {
    strategy: OverflowStrategy,
    producer: F,
}

impl<T, F> Publisher<T> for CreatePublisher<F>
where
    T: Send + 'static,
    F: Fn(FluxSink<T>) + Send + Sync,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let emitter = Arc::new(BufferedEmitter::new(subscriber.clone(), self.strategy));
        subscriber.on_subscribe(emitter.clone());
        let sink = FluxSink {
            emitter: emitter.clone(),
        };
        if let Err(error) = catch_panic(|| (self.producer)(sink)) {
            emitter.fail_now(error);
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Hands a [`FluxSink`] to `producer` for every subscription.
    ///
    /// Items pushed ahead of demand are buffered without bound.
    ///
    /// ```
    /// use reactant_stream::Flux;
    /// use reactant_test_utils::TestSubscriber;
    ///
    /// let flux = Flux::create(|sink| {
    ///     for i in 0..3 {
    ///         sink.next(i).unwrap();
    ///     }
    ///     sink.complete().unwrap();
    /// });
    ///
    /// let probe = TestSubscriber::<i32>::unbounded();
    /// flux.subscribe(probe.clone());
    /// assert_eq!(probe.values(), vec![0, 1, 2]);
    /// ```
    pub fn create<F>(producer: F) -> Self
    where
        F: Fn(FluxSink<T>) + Send + Sync + 'static,
    {
        Self::create_with(OverflowStrategy::default(), producer)
    }

    /// [`create`](Self::create) with an explicit policy for items pushed ahead of demand.
    pub fn create_with<F>(strategy: OverflowStrategy, producer: F) -> Self
    where
        F: Fn(FluxSink<T>) + Send + Sync + 'static,
    {
        Self::from_publisher(CreatePublisher { strategy, producer })
    }
}

/// Producer-side handle of [`Mono::create`].
///
/// The first of `success`, `success_empty` or `error` wins; later calls are ignored.
pub struct MonoSink<T> {
    emitter: Arc<ScalarEmitter<T>>,
}

impl<T: Send + 'static> MonoSink<T> {
    /// Completes with `value`.
    pub fn success(&self, value: T) {
        self.emitter.complete_with(value);
    }

    /// Completes without a value.
    pub fn success_empty(&self) {
        self.emitter.complete_empty();
    }

    /// Fails with `error`.
    pub fn error(&self, error: ReactantError) {
        self.emitter.error(error);
    }

    /// Returns `true` once the subscriber cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.emitter.is_cancelled()
    }

    /// Called once if the subscriber cancels before a result was delivered.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) -> &Self {
        self.emitter.set_on_cancel(hook);
        self
    }
}

impl<T> Clone for MonoSink<T> {
    fn clone(&self) -> Self {
        Self {
            emitter: self.emitter.clone(),
        }
    }
}

struct MonoCreatePublisher<F> {
    producer: F,
}

impl<T, F> Publisher<T> for MonoCreatePublisher<F>
where
    T: Send + 'static,
    F: Fn(MonoSink<T>) + Send + Sync,
{
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
        subscriber.on_subscribe(emitter.clone());
        let sink = MonoSink {
            emitter: emitter.clone(),
        };
        if let Err(error) = catch_panic(|| (self.producer)(sink)) {
            emitter.error(error);
        }
    }
}

impl<T: Send + 'static> Mono<T> {
    /// Hands a [`MonoSink`] to `producer` for every subscription.
    ///
    /// Suited to callback-style APIs: the sink may be completed later, from any thread.
    pub fn create<F>(producer: F) -> Self
    where
        F: Fn(MonoSink<T>) + Send + Sync + 'static,
    {
        Self::from_flux_unchecked(Flux::from_publisher(MonoCreatePublisher { producer }))
    }
}
