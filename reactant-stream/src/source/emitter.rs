// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::backpressure::OverflowStrategy;
use parking_lot::Mutex;
use reactant_core::{Demand, ReactantError, Result, SubscriberRef, Subscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type RequestHook = Box<dyn Fn(u64) + Send + Sync>;
type LifecycleHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Hooks {
    on_request: Option<Arc<dyn Fn(u64) + Send + Sync>>,
    on_cancel: Option<LifecycleHook>,
    on_dispose: Option<LifecycleHook>,
}

/// Serializes items pushed from any number of threads into one demand-respecting
/// `on_next` sequence.
///
/// Producers call [`next`](Self::next) / [`error`](Self::error) /
/// [`complete`](Self::complete) concurrently; whichever caller wins the work-in-progress
/// counter drains the queue while the others only enqueue. Items that cannot be
/// delivered for lack of demand are handled by the [`OverflowStrategy`].
pub(crate) struct BufferedEmitter<T> {
    actual: SubscriberRef<T>,
    strategy: OverflowStrategy,
    queue: Mutex<VecDeque<T>>,
    demand: Demand,
    wip: AtomicUsize,
    // producer side finished; terminal delivered after the queue drains
    done: AtomicBool,
    delayed_error: Mutex<Option<ReactantError>>,
    // delivered ahead of any queued item
    immediate_error: Mutex<Option<ReactantError>>,
    cancelled: AtomicBool,
    terminated: AtomicBool,
    hooks: Mutex<Hooks>,
}

impl<T: Send + 'static> BufferedEmitter<T> {
    pub(crate) fn new(actual: SubscriberRef<T>, strategy: OverflowStrategy) -> Self {
        Self {
            actual,
            strategy,
            queue: Mutex::new(VecDeque::new()),
            demand: Demand::new(),
            wip: AtomicUsize::new(0),
            done: AtomicBool::new(false),
            delayed_error: Mutex::new(None),
            immediate_error: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            hooks: Mutex::new(Hooks::default()),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn requested(&self) -> u64 {
        self.demand.get()
    }

    pub(crate) fn set_on_request(&self, hook: RequestHook) {
        self.hooks.lock().on_request = Some(Arc::from(hook));
    }

    pub(crate) fn set_on_cancel(&self, hook: LifecycleHook) {
        if self.is_cancelled() {
            hook();
            return;
        }
        self.hooks.lock().on_cancel = Some(hook);
    }

    pub(crate) fn set_on_dispose(&self, hook: LifecycleHook) {
        if self.is_cancelled() || self.terminated.load(Ordering::Acquire) {
            hook();
            return;
        }
        self.hooks.lock().on_dispose = Some(hook);
    }

    /// Enqueues `item` for delivery.
    ///
    /// Items pushed after cancellation are dropped silently.
    pub(crate) fn next(&self, item: T) -> Result<()> {
        if self.done.load(Ordering::Acquire) {
            return Err(ReactantError::SignalAfterTerminal { signal: "on_next" });
        }
        if self.is_cancelled() {
            debug!("item dropped: subscription cancelled");
            return Ok(());
        }
        if let Some(overflow) = self.offer(item) {
            self.fail_now(overflow);
        }
        self.drain();
        Ok(())
    }

    fn offer(&self, item: T) -> Option<ReactantError> {
        let mut queue = self.queue.lock();
        let queued = queue.len() as u64;
        match self.strategy {
            OverflowStrategy::Buffer { capacity: None } => queue.push_back(item),
            OverflowStrategy::Buffer {
                capacity: Some(capacity),
            } => {
                if queue.len() >= capacity {
                    return Some(ReactantError::overflow(format!(
                        "buffer of {capacity} items is full"
                    )));
                }
                queue.push_back(item);
            }
            OverflowStrategy::Drop => {
                if queued < self.demand.get() {
                    queue.push_back(item);
                } else {
                    debug!("item dropped: no outstanding demand");
                }
            }
            OverflowStrategy::Latest => {
                if queued < self.demand.get().max(1) {
                    queue.push_back(item);
                } else if let Some(last) = queue.back_mut() {
                    *last = item;
                }
            }
            OverflowStrategy::Error => {
                if queued >= self.demand.get() {
                    return Some(ReactantError::overflow(
                        "item produced without outstanding demand",
                    ));
                }
                queue.push_back(item);
            }
        }
        None
    }

    /// Terminates with `error` once queued items were delivered.
    pub(crate) fn error(&self, error: ReactantError) -> Result<()> {
        if self.done.swap(true, Ordering::AcqRel) {
            return Err(ReactantError::SignalAfterTerminal { signal: "on_error" });
        }
        *self.delayed_error.lock() = Some(error);
        self.drain();
        Ok(())
    }

    /// Completes once queued items were delivered.
    pub(crate) fn complete(&self) -> Result<()> {
        if self.done.swap(true, Ordering::AcqRel) {
            return Err(ReactantError::SignalAfterTerminal {
                signal: "on_complete",
            });
        }
        self.drain();
        Ok(())
    }

    /// Terminates with `error` ahead of anything still queued.
    pub(crate) fn fail_now(&self, error: ReactantError) {
        self.done.store(true, Ordering::Release);
        let mut slot = self.immediate_error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.run_cancel_hook();
        self.drain();
    }

    fn run_cancel_hook(&self) {
        let hook = self.hooks.lock().on_cancel.take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn dispose(&self) {
        let hook = self.hooks.lock().on_dispose.take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            if self.drain_pass() {
                // wip stays raised: nothing may drain after the terminal signal
                return;
            }
            let previous = self.wip.fetch_sub(missed, Ordering::AcqRel);
            missed = previous - missed;
            if missed == 0 {
                return;
            }
        }
    }

    /// Returns `true` once the sequence is finished and nothing more may be delivered.
    fn drain_pass(&self) -> bool {
        let requested = self.demand.get();
        let mut emitted = 0u64;
        loop {
            if self.is_cancelled() {
                self.queue.lock().clear();
                return true;
            }
            let immediate = self.immediate_error.lock().take();
            if let Some(error) = immediate {
                self.queue.lock().clear();
                self.terminate(Some(error));
                return true;
            }
            if emitted == requested {
                break;
            }
            let item = self.queue.lock().pop_front();
            match item {
                Some(item) => {
                    self.actual.on_next(item);
                    emitted += 1;
                }
                None => break,
            }
        }
        if emitted > 0 {
            self.demand.produced(emitted);
        }

        if self.done.load(Ordering::Acquire) && self.queue.lock().is_empty() {
            let error = self.delayed_error.lock().take();
            self.terminate(error);
            return true;
        }
        false
    }

    fn terminate(&self, error: Option<ReactantError>) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        match error {
            Some(error) => self.actual.on_error(error),
            None => self.actual.on_complete(),
        }
        self.dispose();
    }
}

impl<T: Send + 'static> Subscription for BufferedEmitter<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.fail_now(ReactantError::illegal_demand(n));
            return;
        }
        self.demand.add(n);
        let hook = self.hooks.lock().on_request.clone();
        if let Some(hook) = hook {
            hook(n);
        }
        self.drain();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.run_cancel_hook();
        self.dispose();
        self.drain();
    }
}
