// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Strategies for items produced faster than they are requested.
//!
//! The `on_backpressure_*` operators request everything from their upstream and apply
//! an [`OverflowStrategy`] to whatever the downstream has not asked for yet. The same
//! strategies govern [`Flux::create_with`].

use crate::flux::Flux;
use crate::source::emitter::BufferedEmitter;
use reactant_core::{
    Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef, SubscriptionRef,
    UpstreamSlot, UNBOUNDED,
};
use std::sync::Arc;

/// What to do with an item that arrives while the subscriber has no outstanding demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowStrategy {
    /// Queue the item. With a `capacity`, a full queue fails the sequence with `Overflow`.
    Buffer {
        /// Maximum number of queued items, unbounded when `None`
        capacity: Option<usize>,
    },
    /// Discard the item.
    Drop,
    /// Keep only the most recent undelivered item.
    Latest,
    /// Fail the sequence with `Overflow`.
    Error,
}

impl Default for OverflowStrategy {
    fn default() -> Self {
        Self::Buffer { capacity: None }
    }
}

struct BackpressurePublisher<T> {
    source: PublisherRef<T>,
    strategy: OverflowStrategy,
}

struct BackpressureSubscriber<T> {
    emitter: Arc<BufferedEmitter<T>>,
    upstream: Arc<UpstreamSlot>,
}

impl<T: Send + 'static> Publisher<T> for BackpressurePublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let emitter = Arc::new(BufferedEmitter::new(subscriber.clone(), self.strategy));
        let upstream = Arc::new(UpstreamSlot::new());
        let on_cancel = upstream.clone();
        emitter.set_on_cancel(Box::new(move || on_cancel.cancel()));
        subscriber.on_subscribe(emitter.clone());
        self.source
            .subscribe(Arc::new(BackpressureSubscriber { emitter, upstream }));
    }
}

impl<T: Send + 'static> Subscriber<T> for BackpressureSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set_once(subscription.clone()) {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&self, item: T) {
        if self.emitter.next(item).is_err() {
            debug!("item dropped: buffer already terminated");
        }
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        if let Err(late) = self.emitter.error(error) {
            debug!("upstream error ignored: {}", late);
        }
    }

    fn on_complete(&self) {
        self.upstream.close();
        if let Err(late) = self.emitter.complete() {
            debug!("upstream completion ignored: {}", late);
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Requests everything from upstream and applies `strategy` to undelivered items.
    pub fn on_backpressure(self, strategy: OverflowStrategy) -> Self {
        Self::from_publisher(BackpressurePublisher {
            source: self.as_publisher(),
            strategy,
        })
    }

    /// Buffers undelivered items; more than `capacity` of them fails with `Overflow`.
    pub fn on_backpressure_buffer(self, capacity: usize) -> Self {
        self.on_backpressure(OverflowStrategy::Buffer {
            capacity: Some(capacity),
        })
    }

    /// Discards items that arrive without outstanding demand.
    pub fn on_backpressure_drop(self) -> Self {
        self.on_backpressure(OverflowStrategy::Drop)
    }

    /// Keeps only the latest item that arrived without outstanding demand.
    pub fn on_backpressure_latest(self) -> Self {
        self.on_backpressure(OverflowStrategy::Latest)
    }

    /// Fails with `Overflow` when an item arrives without outstanding demand.
    pub fn on_backpressure_error(self) -> Self {
        self.on_backpressure(OverflowStrategy::Error)
    }
}
