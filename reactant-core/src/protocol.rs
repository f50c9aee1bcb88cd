// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The Publisher / Subscriber / Subscription protocol.
//!
//! # Rules
//!
//! - `Publisher::subscribe` calls `on_subscribe` exactly once, before any other signal.
//! - `on_next` calls for one subscription never overlap and never exceed the cumulative
//!   demand passed to `Subscription::request`.
//! - Exactly one of `on_error` / `on_complete` ends the sequence; nothing follows it.
//!   Terminal signals are not governed by demand.
//! - `request(0)` is illegal and is answered with `on_error(IllegalDemand)`.
//! - `cancel()` is idempotent. Once it returns, the publisher starts no new delivery.
//!
//! All three traits take `&self` so that a stage can be shared between the thread that
//! requests and the thread that emits; stages keep their mutable state behind atomics or
//! short-lived locks and never hold a lock while signalling another stage.

use crate::error::ReactantError;
use std::sync::Arc;

/// Flow-control handle between one publisher and one subscriber.
pub trait Subscription: Send + Sync {
    /// Authorize the publisher to emit `n` more items.
    ///
    /// Demand accumulates and saturates at [`UNBOUNDED`](crate::UNBOUNDED).
    fn request(&self, n: u64);

    /// Stop the flow of signals and release upstream resources.
    fn cancel(&self);
}

/// Shared handle to a subscription.
pub type SubscriptionRef = Arc<dyn Subscription>;

/// Consumer of a signal sequence.
pub trait Subscriber<T>: Send + Sync {
    /// Receives the subscription; always the first signal.
    fn on_subscribe(&self, subscription: SubscriptionRef);

    /// Receives one item.
    fn on_next(&self, item: T);

    /// Terminal failure.
    fn on_error(&self, error: ReactantError);

    /// Terminal success.
    fn on_complete(&self);
}

/// Shared handle to a subscriber.
pub type SubscriberRef<T> = Arc<dyn Subscriber<T>>;

/// Source of a signal sequence.
///
/// A publisher may be subscribed to many times; each call creates an independent
/// subscription unless the source documents itself as single-subscriber.
pub trait Publisher<T>: Send + Sync {
    /// Attach `subscriber`, which will receive `on_subscribe` before anything else.
    fn subscribe(&self, subscriber: SubscriberRef<T>);
}

/// Shared handle to a publisher.
pub type PublisherRef<T> = Arc<dyn Publisher<T>>;

/// Subscription for sequences that terminate without emitting.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl EmptySubscription {
    /// Subscribe `subscriber` and complete it immediately.
    pub fn complete<T>(subscriber: &SubscriberRef<T>) {
        subscriber.on_subscribe(Arc::new(Self));
        subscriber.on_complete();
    }

    /// Subscribe `subscriber` and fail it immediately.
    pub fn error<T>(subscriber: &SubscriberRef<T>, error: ReactantError) {
        subscriber.on_subscribe(Arc::new(Self));
        subscriber.on_error(error);
    }
}

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
