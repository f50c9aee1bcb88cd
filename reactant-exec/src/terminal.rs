// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Awaiting the outcome of a sequence.

use futures::channel::oneshot;
use parking_lot::Mutex;
use reactant_core::{
    Publisher, ReactantError, Result, Subscriber, SubscriptionRef, UpstreamSlot, UNBOUNDED,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pick {
    First,
    Last,
}

struct TerminalSubscriber<T> {
    pick: Pick,
    upstream: Arc<UpstreamSlot>,
    latest: Mutex<Option<T>>,
    sender: Mutex<Option<oneshot::Sender<Result<Option<T>>>>>,
}

impl<T> TerminalSubscriber<T> {
    fn finish(&self, outcome: Result<Option<T>>) {
        let sender = self.sender.lock().take();
        if let Some(sender) = sender {
            if sender.send(outcome).is_err() {
                debug!("outcome dropped: nobody is waiting for it");
            }
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for TerminalSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set_once(subscription.clone()) {
            subscription.request(match self.pick {
                Pick::First => 1,
                Pick::Last => UNBOUNDED,
            });
        }
    }

    fn on_next(&self, item: T) {
        match self.pick {
            Pick::First => {
                self.upstream.cancel();
                self.finish(Ok(Some(item)));
            }
            Pick::Last => *self.latest.lock() = Some(item),
        }
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        self.finish(Err(error));
    }

    fn on_complete(&self) {
        self.upstream.close();
        let last = self.latest.lock().take();
        self.finish(Ok(last));
    }
}

/// Resolves to the first or last item of a sequence, `None` when it completed empty.
///
/// The subscription is made when the future is created. Dropping the future before it
/// resolves cancels the subscription.
#[must_use = "dropping the future cancels the subscription"]
pub struct TerminalFuture<T> {
    receiver: oneshot::Receiver<Result<Option<T>>>,
    upstream: Arc<UpstreamSlot>,
    resolved: bool,
}

impl<T: Send + 'static> TerminalFuture<T> {
    pub(crate) fn subscribe<P>(publisher: &P, pick: Pick) -> Self
    where
        P: Publisher<T> + ?Sized,
    {
        let (sender, receiver) = oneshot::channel();
        let upstream = Arc::new(UpstreamSlot::new());
        publisher.subscribe(Arc::new(TerminalSubscriber {
            pick,
            upstream: upstream.clone(),
            latest: Mutex::new(None),
            sender: Mutex::new(Some(sender)),
        }));
        Self {
            receiver,
            upstream,
            resolved: false,
        }
    }
}

impl<T> Future for TerminalFuture<T> {
    type Output = Result<Option<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(outcome) => {
                this.resolved = true;
                Poll::Ready(outcome.unwrap_or_else(|_| {
                    Err(ReactantError::stream_error(
                        "subscriber dropped before a terminal signal",
                    ))
                }))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for TerminalFuture<T> {
    fn drop(&mut self) {
        if !self.resolved {
            self.upstream.cancel();
        }
    }
}

/// Converts a publisher into a future of its last item.
pub trait IntoFutureExt<T>: Publisher<T> {
    /// Subscribes now and resolves to the last item, `None` for an empty sequence.
    ///
    /// ```
    /// use reactant_exec::IntoFutureExt;
    /// use reactant_stream::Flux;
    ///
    /// let last = futures::executor::block_on(Flux::range(0, 5).into_future());
    /// assert!(matches!(last, Ok(Some(4))));
    /// ```
    fn into_future(self) -> TerminalFuture<T>
    where
        Self: Sized;

    /// Subscribes now and resolves to the first item, cancelling the rest.
    fn first_future(&self) -> TerminalFuture<T>;
}

impl<T, P> IntoFutureExt<T> for P
where
    T: Send + 'static,
    P: Publisher<T>,
{
    fn into_future(self) -> TerminalFuture<T> {
        TerminalFuture::subscribe(&self, Pick::Last)
    }

    fn first_future(&self) -> TerminalFuture<T> {
        TerminalFuture::subscribe(self, Pick::First)
    }
}
