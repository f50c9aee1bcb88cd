// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A transparent publisher wrapper that records the traffic crossing it.

use reactant_core::demand::add_cap;
use reactant_core::{
    Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef, Subscription,
    SubscriptionRef,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ProbeCounters {
    subscriptions: AtomicUsize,
    requested: AtomicU64,
    cancellations: AtomicUsize,
    items: AtomicU64,
    terminals: AtomicUsize,
}

/// Wraps a publisher and counts subscriptions, requests, cancellations and items.
///
/// Insert a probe between two stages to check what one stage asks of the other, for
/// example that cancelling downstream reaches every upstream.
pub struct PublisherProbe<T> {
    source: PublisherRef<T>,
    counters: Arc<ProbeCounters>,
}

impl<T: Send + 'static> PublisherProbe<T> {
    /// Wraps `source`.
    pub fn new(source: impl Publisher<T> + 'static) -> Arc<Self> {
        Self::wrap(Arc::new(source))
    }

    /// Wraps an already shared publisher.
    pub fn wrap(source: PublisherRef<T>) -> Arc<Self> {
        Arc::new(Self {
            source,
            counters: Arc::new(ProbeCounters::default()),
        })
    }

    /// Number of subscriptions made through the probe.
    pub fn subscription_count(&self) -> usize {
        self.counters.subscriptions.load(Ordering::Acquire)
    }

    /// Total demand requested through the probe.
    pub fn requested(&self) -> u64 {
        self.counters.requested.load(Ordering::Acquire)
    }

    /// Number of `cancel` calls that crossed the probe.
    pub fn cancel_count(&self) -> usize {
        self.counters.cancellations.load(Ordering::Acquire)
    }

    /// Returns `true` if any subscription was cancelled through the probe.
    pub fn was_cancelled(&self) -> bool {
        self.cancel_count() > 0
    }

    /// Number of items that crossed the probe.
    pub fn item_count(&self) -> u64 {
        self.counters.items.load(Ordering::Acquire)
    }

    /// Number of terminal signals that crossed the probe.
    pub fn terminal_count(&self) -> usize {
        self.counters.terminals.load(Ordering::Acquire)
    }
}

impl<T: Send + 'static> Publisher<T> for PublisherProbe<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.counters.subscriptions.fetch_add(1, Ordering::AcqRel);
        self.source.subscribe(Arc::new(ProbeSubscriber {
            actual: subscriber,
            counters: self.counters.clone(),
        }));
    }
}

struct ProbeSubscriber<T> {
    actual: SubscriberRef<T>,
    counters: Arc<ProbeCounters>,
}

impl<T: Send + 'static> Subscriber<T> for ProbeSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        self.actual.on_subscribe(Arc::new(ProbeSubscription {
            upstream: subscription,
            counters: self.counters.clone(),
        }));
    }

    fn on_next(&self, item: T) {
        self.counters.items.fetch_add(1, Ordering::AcqRel);
        self.actual.on_next(item);
    }

    fn on_error(&self, error: ReactantError) {
        self.counters.terminals.fetch_add(1, Ordering::AcqRel);
        self.actual.on_error(error);
    }

    fn on_complete(&self) {
        self.counters.terminals.fetch_add(1, Ordering::AcqRel);
        self.actual.on_complete();
    }
}

struct ProbeSubscription {
    upstream: SubscriptionRef,
    counters: Arc<ProbeCounters>,
}

impl Subscription for ProbeSubscription {
    fn request(&self, n: u64) {
        let _ = self
            .counters
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(add_cap(current, n))
            });
        self.upstream.request(n);
    }

    fn cancel(&self) {
        self.counters.cancellations.fetch_add(1, Ordering::AcqRel);
        self.upstream.cancel();
    }
}
