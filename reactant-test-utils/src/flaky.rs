// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A source that fails a fixed number of times before it succeeds.

use crate::fixtures::test_error;
use parking_lot::Mutex;
use reactant_core::{
    Demand, EmptySubscription, Publisher, ReactantError, SubscriberRef, Subscription,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fails each of its first `failures` subscriptions with an upstream error, then emits
/// `values` to every later subscription.
///
/// The subscription counter is shared by all subscribers, which is what makes a
/// `retry` around this source eventually succeed.
pub struct FlakySource<T> {
    failures: usize,
    values: Vec<T>,
    attempts: AtomicUsize,
}

impl<T: Clone + Send + Sync + 'static> FlakySource<T> {
    /// A source failing `failures` times before emitting `values`.
    pub fn new(failures: usize, values: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            failures,
            values,
            attempts: AtomicUsize::new(0),
        })
    }

    /// Number of subscriptions seen so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for FlakySource<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        if attempt <= self.failures {
            EmptySubscription::error(&subscriber, test_error(&format!("attempt {}", attempt)));
            return;
        }
        let subscription = Arc::new(VecSubscription {
            actual: subscriber.clone(),
            queue: Mutex::new(self.values.iter().cloned().collect()),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        });
        subscriber.on_subscribe(subscription.clone());
        if self.values.is_empty() {
            subscription.drain();
        }
    }
}

struct VecSubscription<T> {
    actual: SubscriberRef<T>,
    queue: Mutex<VecDeque<T>>,
    demand: Demand,
    wip: AtomicUsize,
    cancelled: AtomicBool,
}

impl<T: Send + 'static> VecSubscription<T> {
    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            while !self.cancelled.load(Ordering::Acquire) {
                let empty = self.queue.lock().is_empty();
                if empty {
                    self.cancelled.store(true, Ordering::Release);
                    self.actual.on_complete();
                    return;
                }
                if !self.demand.try_take_one() {
                    break;
                }
                let item = self.queue.lock().pop_front();
                if let Some(item) = item {
                    self.actual.on_next(item);
                }
            }
            let previous = self.wip.fetch_sub(missed, Ordering::AcqRel);
            missed = previous - missed;
            if missed == 0 {
                return;
            }
        }
    }
}

impl<T: Send + 'static> Subscription for VecSubscription<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.cancelled.store(true, Ordering::Release);
            self.actual.on_error(ReactantError::illegal_demand(n));
            return;
        }
        self.demand.add(n);
        self.drain();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
