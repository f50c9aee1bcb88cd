// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A recording subscriber that checks the protocol rules as signals arrive.

use parking_lot::Mutex;
use reactant_core::demand::add_cap;
use reactant_core::{
    CancellationToken, ReactantError, Signal, Subscriber, SubscriptionRef, UNBOUNDED,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Recorded<T> {
    subscription: Option<SubscriptionRef>,
    values: Vec<T>,
    errors: Vec<ReactantError>,
    completions: usize,
    violations: Vec<String>,
}

/// Records every signal and every protocol rule the publisher breaks.
///
/// A `TestSubscriber` requests `initial_request` items when subscribed and, when built
/// with [`one_by_one`](Self::one_by_one), one more after each item. Rule violations are
/// never panics; they are collected in [`violations`](Self::violations) so a test can
/// assert that the list is empty.
///
/// # Example
///
/// ```rust
/// use reactant_core::{EmptySubscription, Subscriber, SubscriberRef};
/// use reactant_test_utils::TestSubscriber;
///
/// let probe = TestSubscriber::<i32>::new(1);
/// let subscriber: SubscriberRef<i32> = probe.clone();
/// EmptySubscription::complete(&subscriber);
///
/// assert!(probe.is_completed());
/// assert!(probe.violations().is_empty());
/// ```
pub struct TestSubscriber<T> {
    recorded: Mutex<Recorded<T>>,
    initial_request: u64,
    replenish: bool,
    cancel_after: Option<u64>,
    requested: AtomicU64,
    delivered: AtomicU64,
    in_next: AtomicBool,
    terminal: CancellationToken,
}

impl<T: Send + 'static> TestSubscriber<T> {
    /// A subscriber requesting `initial_request` items on subscription.
    pub fn new(initial_request: u64) -> Arc<Self> {
        Self::build(initial_request, false, None)
    }

    /// A subscriber requesting everything.
    pub fn unbounded() -> Arc<Self> {
        Self::new(UNBOUNDED)
    }

    /// A subscriber requesting one item at a time.
    pub fn one_by_one() -> Arc<Self> {
        Self::build(1, true, None)
    }

    /// A subscriber that requests everything and cancels from inside `on_next` once it
    /// has received `count` items.
    pub fn cancelling_after(count: u64) -> Arc<Self> {
        Self::build(UNBOUNDED, false, Some(count))
    }

    fn build(initial_request: u64, replenish: bool, cancel_after: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            recorded: Mutex::new(Recorded {
                subscription: None,
                values: Vec::new(),
                errors: Vec::new(),
                completions: 0,
                violations: Vec::new(),
            }),
            initial_request,
            replenish,
            cancel_after,
            requested: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            in_next: AtomicBool::new(false),
            terminal: CancellationToken::new(),
        })
    }

    /// Requests `n` more items from the publisher.
    pub fn request(&self, n: u64) {
        let _ = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(add_cap(current, n))
            });
        let subscription = self.recorded.lock().subscription.clone();
        match subscription {
            Some(subscription) => subscription.request(n),
            None => self.violation("request before on_subscribe".to_string()),
        }
    }

    /// Cancels the subscription.
    pub fn cancel(&self) {
        let subscription = self.recorded.lock().subscription.clone();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    /// Items received so far, in order.
    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.recorded.lock().values.clone()
    }

    /// Number of items received so far.
    pub fn value_count(&self) -> usize {
        self.recorded.lock().values.len()
    }

    /// Errors received so far; more than one is a violation.
    pub fn errors(&self) -> Vec<ReactantError> {
        self.recorded.lock().errors.clone()
    }

    /// The first error received.
    pub fn error(&self) -> Option<ReactantError> {
        self.recorded.lock().errors.first().cloned()
    }

    /// Returns `true` once `on_complete` arrived.
    pub fn is_completed(&self) -> bool {
        self.recorded.lock().completions > 0
    }

    /// Returns `true` once any terminal signal arrived.
    pub fn is_terminated(&self) -> bool {
        self.terminal.is_cancelled()
    }

    /// Returns `true` once `on_subscribe` arrived.
    pub fn is_subscribed(&self) -> bool {
        self.recorded.lock().subscription.is_some()
    }

    /// Total demand signalled so far.
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Protocol rules broken so far, described in plain text.
    pub fn violations(&self) -> Vec<String> {
        self.recorded.lock().violations.clone()
    }

    /// Blocks until a terminal signal arrives or `timeout` elapses.
    ///
    /// Returns `true` if the sequence terminated.
    pub fn await_terminal(&self, timeout: Duration) -> bool {
        self.terminal.wait_timeout(timeout)
    }

    /// Blocks until at least `count` items arrived or `timeout` elapses.
    pub fn await_values(&self, count: usize, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.value_count() < count {
            if std::time::Instant::now() >= deadline || self.is_terminated() {
                return self.value_count() >= count;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    fn violation(&self, description: String) {
        self.recorded.lock().violations.push(description);
    }

    fn check_not_terminated<U>(&self, signal: &Signal<U>) {
        if self.terminal.is_cancelled() {
            self.violation(format!("{} after terminal signal", signal.name()));
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for TestSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        let mut recorded = self.recorded.lock();
        if recorded.subscription.is_some() {
            recorded
                .violations
                .push("on_subscribe received twice".to_string());
            drop(recorded);
            subscription.cancel();
            return;
        }
        recorded.subscription = Some(subscription);
        drop(recorded);
        if self.initial_request > 0 {
            self.request(self.initial_request);
        }
    }

    fn on_next(&self, item: T) {
        if !self.is_subscribed() {
            self.violation("on_next before on_subscribe".to_string());
        }
        self.check_not_terminated(&Signal::Next(()));
        if self.in_next.swap(true, Ordering::AcqRel) {
            self.violation("overlapping on_next".to_string());
        }
        let delivered = self.delivered.fetch_add(1, Ordering::AcqRel) + 1;
        let requested = self.requested.load(Ordering::Acquire);
        if delivered > requested {
            self.violation(format!(
                "demand exceeded: {} items delivered for {} requested",
                delivered, requested
            ));
        }
        self.recorded.lock().values.push(item);
        self.in_next.store(false, Ordering::Release);

        if self.cancel_after == Some(delivered) {
            self.cancel();
        } else if self.replenish {
            self.request(1);
        }
    }

    fn on_error(&self, error: ReactantError) {
        let signal = Signal::<()>::Error(error);
        self.check_not_terminated(&signal);
        if let Signal::Error(error) = signal {
            self.recorded.lock().errors.push(error);
        }
        self.terminal.cancel();
    }

    fn on_complete(&self) {
        self.check_not_terminated(&Signal::<()>::Complete);
        self.recorded.lock().completions += 1;
        self.terminal.cancel();
    }
}
