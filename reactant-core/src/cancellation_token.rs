// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A one-shot "stop" flag that threads can block on and futures can await.
//!
//! Scheduler workers use it to learn about disposal, task handles to abandon pending
//! work, and the blocking boundary to give up a wait.

use event_listener::{Event, EventListener, Listener};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

#[derive(Debug)]
struct Shared {
    fired: AtomicBool,
    waiters: Event,
}

/// A flag that flips once, from "running" to "cancelled", and wakes everyone waiting.
///
/// Clones observe the same flag.
///
/// ```
/// use reactant_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let remote = token.clone();
///
/// let waiter = std::thread::spawn(move || {
///     futures::executor::block_on(remote.cancelled());
/// });
///
/// token.cancel();
/// waiter.join().unwrap();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    /// A token that has not fired.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                fired: AtomicBool::new(false),
                waiters: Event::new(),
            }),
        }
    }

    /// Fires the token. Later calls do nothing.
    pub fn cancel(&self) {
        if !self.shared.fired.swap(true, Ordering::AcqRel) {
            self.shared.waiters.notify(usize::MAX);
        }
    }

    /// Returns `true` once the token fired.
    pub fn is_cancelled(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// A future resolving once the token fires.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
            listener: None,
        }
    }

    /// Parks the thread until the token fires or `timeout` elapses.
    ///
    /// Returns whether the token fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let listener = self.shared.waiters.listen();
        // a cancel() racing with listen() has already notified
        if !self.is_cancelled() {
            listener.wait_timeout(timeout);
        }
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
#[must_use = "futures do nothing unless polled"]
pub struct Cancelled {
    token: CancellationToken,
    listener: Option<EventListener>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        loop {
            if this.token.is_cancelled() {
                return Poll::Ready(());
            }
            match this.listener.as_mut() {
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    this.listener = None;
                }
                None => this.listener = Some(this.token.shared.waiters.listen()),
            }
        }
    }
}
