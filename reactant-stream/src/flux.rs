// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::mono::Mono;
use reactant_core::{Publisher, PublisherRef, SubscriberRef};
use std::fmt;
use std::sync::Arc;

/// A cold sequence of zero or more items followed by one terminal signal.
///
/// `Flux` is a cheap, cloneable handle to a [`Publisher`]. Operators return new
/// `Flux` values wrapping the previous stage, so a pipeline is a chain of publishers
/// that each subscribe to their upstream when a subscriber arrives. Nothing runs until
/// then, and every subscription runs the pipeline independently.
///
/// # Example
///
/// ```
/// use reactant_stream::Flux;
/// use reactant_test_utils::TestSubscriber;
///
/// let probe = TestSubscriber::<i64>::unbounded();
/// Flux::range(1, 5)
///     .filter(|x| x % 2 == 0)
///     .map(|x| x * 10)
///     .subscribe(probe.clone());
///
/// assert_eq!(probe.values(), vec![20, 40]);
/// assert!(probe.is_completed());
/// ```
pub struct Flux<T> {
    source: PublisherRef<T>,
}

impl<T: Send + 'static> Flux<T> {
    /// Wraps any publisher.
    pub fn from_publisher(publisher: impl Publisher<T> + 'static) -> Self {
        Self {
            source: Arc::new(publisher),
        }
    }

    /// Wraps an already shared publisher.
    pub fn from_shared(source: PublisherRef<T>) -> Self {
        Self { source }
    }

    /// Attaches `subscriber`; it receives `on_subscribe` before anything else.
    pub fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.source.subscribe(subscriber);
    }

    /// The publisher behind this handle.
    pub fn as_publisher(&self) -> PublisherRef<T> {
        self.source.clone()
    }

    /// Narrows this sequence to at most one item: the first one, cancelling the rest.
    pub fn into_mono(self) -> Mono<T> {
        Mono::from_flux_unchecked(self.take(1))
    }
}

impl<T> Clone for Flux<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for Flux<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Flux")
    }
}

impl<T: Send + 'static> Publisher<T> for Flux<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.source.subscribe(subscriber);
    }
}

impl<T: Send + 'static> From<Mono<T>> for Flux<T> {
    fn from(mono: Mono<T>) -> Self {
        mono.flux()
    }
}
