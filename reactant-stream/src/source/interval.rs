// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::scalar::ScalarEmitter;
use crate::flux::Flux;
use crate::mono::Mono;
use parking_lot::Mutex;
use reactant_core::{
    catch_panic, Demand, Publisher, ReactantError, SubscriberRef, Subscription,
};
use reactant_runtime::{SchedulerRef, TaskHandle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct IntervalSubscription {
    actual: SubscriberRef<u64>,
    demand: Demand,
    counter: AtomicU64,
    cancelled: AtomicBool,
    // held by the tick while it is inside on_next
    emitting: AtomicBool,
    pending_error: Mutex<Option<ReactantError>>,
    task: Mutex<Option<TaskHandle>>,
}

impl IntervalSubscription {
    fn tick(&self) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        if self.emitting.swap(true, Ordering::AcqRel) {
            return;
        }
        let outcome = if self.demand.try_take_one() {
            let count = self.counter.fetch_add(1, Ordering::Relaxed);
            catch_panic(|| self.actual.on_next(count))
        } else {
            let count = self.counter.load(Ordering::Relaxed);
            Err(ReactantError::overflow(format!(
                "interval tick {count} arrived without outstanding demand"
            )))
        };
        self.emitting.store(false, Ordering::Release);
        if let Err(error) = outcome {
            self.fail(error);
        }
        self.deliver_pending();
    }

    /// Reports an error raised outside the tick once no `on_next` is in flight.
    fn deliver_pending(&self) {
        if self.pending_error.lock().is_none() {
            return;
        }
        if self.emitting.swap(true, Ordering::AcqRel) {
            return;
        }
        let error = self.pending_error.lock().take();
        if let Some(error) = error {
            self.fail(error);
        }
        self.emitting.store(false, Ordering::Release);
    }

    fn fail(&self, error: ReactantError) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop_timer();
        self.actual.on_error(error);
    }

    fn stop_timer(&self) {
        if let Some(task) = self.task.lock().take() {
            task.cancel();
        }
    }
}

impl Subscription for IntervalSubscription {
    fn request(&self, n: u64) {
        if n == 0 {
            let mut pending = self.pending_error.lock();
            if pending.is_none() {
                *pending = Some(ReactantError::illegal_demand(n));
            }
            drop(pending);
            self.deliver_pending();
            return;
        }
        self.demand.add(n);
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.stop_timer();
        }
    }
}

struct IntervalPublisher {
    period: Duration,
    scheduler: SchedulerRef,
}

impl Publisher<u64> for IntervalPublisher {
    fn subscribe(&self, subscriber: SubscriberRef<u64>) {
        let subscription = Arc::new(IntervalSubscription {
            actual: subscriber.clone(),
            demand: Demand::new(),
            counter: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            emitting: AtomicBool::new(false),
            pending_error: Mutex::new(None),
            task: Mutex::new(None),
        });
        subscriber.on_subscribe(subscription.clone());
        if subscription.cancelled.load(Ordering::Acquire) {
            return;
        }

        let ticker = subscription.clone();
        let scheduled = self.scheduler.schedule_periodically(
            self.period,
            self.period,
            Box::new(move || ticker.tick()),
        );
        match scheduled {
            Ok(task) => {
                *subscription.task.lock() = Some(task);
                // cancel() may have run before the handle was stored
                if subscription.cancelled.load(Ordering::Acquire) {
                    subscription.stop_timer();
                }
            }
            Err(error) => subscription.fail(error),
        }
    }
}

impl Flux<u64> {
    /// Emits `0, 1, 2, ...` every `period` on `scheduler`.
    ///
    /// The timer starts on subscription and stops on cancellation. A tick that finds no
    /// outstanding demand terminates the sequence with an `Overflow` error rather than
    /// exceeding the subscriber's demand. A subscriber panicking in `on_next` stops the
    /// timer and receives `on_error(Panicked)`.
    pub fn interval(period: Duration, scheduler: SchedulerRef) -> Self {
        Self::from_publisher(IntervalPublisher { period, scheduler })
    }
}

struct DelayPublisher {
    delay: Duration,
    scheduler: SchedulerRef,
}

impl Publisher<u64> for DelayPublisher {
    fn subscribe(&self, subscriber: SubscriberRef<u64>) {
        let emitter = Arc::new(ScalarEmitter::new(subscriber.clone()));
        subscriber.on_subscribe(emitter.clone());
        if emitter.is_cancelled() {
            return;
        }
        let target = emitter.clone();
        match self.scheduler.schedule_delayed(
            self.delay,
            Box::new(move || {
                target.complete_with(0);
            }),
        ) {
            Ok(task) => emitter.set_on_cancel(move || task.cancel()),
            Err(error) => {
                emitter.error(error);
            }
        }
    }
}

impl Mono<u64> {
    /// Emits `0` once `delay` has elapsed on `scheduler`.
    pub fn delay(delay: Duration, scheduler: SchedulerRef) -> Self {
        Self::from_flux_unchecked(Flux::from_publisher(DelayPublisher { delay, scheduler }))
    }
}
