// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::Stream;
use parking_lot::Mutex;
use reactant_core::{
    Publisher, ReactantError, Result, Subscriber, SubscriptionRef, UpstreamSlot,
};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

struct StreamState<T> {
    queue: VecDeque<T>,
    // Some(None) is completion
    terminal: Option<Option<ReactantError>>,
    waker: Option<Waker>,
}

struct Shared<T> {
    state: Mutex<StreamState<T>>,
    upstream: UpstreamSlot,
}

impl<T> Shared<T> {
    fn update(&self, apply: impl FnOnce(&mut StreamState<T>)) {
        let waker = {
            let mut state = self.state.lock();
            apply(&mut state);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

struct StreamSubscriber<T> {
    shared: Arc<Shared<T>>,
    prefetch: u64,
}

impl<T: Send + 'static> Subscriber<T> for StreamSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.shared.upstream.set_once(subscription.clone()) {
            subscription.request(self.prefetch);
        }
    }

    fn on_next(&self, item: T) {
        self.shared.update(|state| state.queue.push_back(item));
    }

    fn on_error(&self, error: ReactantError) {
        self.shared.upstream.close();
        self.shared.update(|state| state.terminal = Some(Some(error)));
    }

    fn on_complete(&self) {
        self.shared.upstream.close();
        self.shared.update(|state| state.terminal = Some(None));
    }
}

/// A `futures::Stream` view of a publisher.
///
/// Requests `prefetch` items up front and tops demand up in batches as items are
/// polled. An error ends the stream after being yielded once. Dropping the stream
/// cancels the subscription.
pub struct SignalStream<T> {
    shared: Arc<Shared<T>>,
    limit: u64,
    consumed: u64,
    finished: bool,
}

impl<T> Stream for SignalStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let mut state = this.shared.state.lock();
        let next = state.queue.pop_front();
        if let Some(item) = next {
            drop(state);
            this.consumed += 1;
            if this.consumed == this.limit {
                this.consumed = 0;
                this.shared.upstream.request(this.limit);
            }
            return Poll::Ready(Some(Ok(item)));
        }

        match state.terminal.take() {
            Some(Some(error)) => {
                this.finished = true;
                Poll::Ready(Some(Err(error)))
            }
            Some(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for SignalStream<T> {
    fn drop(&mut self) {
        self.shared.upstream.cancel();
    }
}

/// Bridges a publisher into async code as a [`Stream`].
pub trait ToStreamExt<T>: Publisher<T> {
    /// Subscribes now and exposes the items as a stream, requesting `prefetch` at a time.
    fn to_stream(&self, prefetch: usize) -> SignalStream<T>;
}

impl<T, P> ToStreamExt<T> for P
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    fn to_stream(&self, prefetch: usize) -> SignalStream<T> {
        let prefetch = prefetch.max(1) as u64;
        let shared = Arc::new(Shared {
            state: Mutex::new(StreamState {
                queue: VecDeque::new(),
                terminal: None,
                waker: None,
            }),
            upstream: UpstreamSlot::new(),
        });
        self.subscribe(Arc::new(StreamSubscriber {
            shared: shared.clone(),
            prefetch,
        }));
        SignalStream {
            shared,
            limit: (prefetch - prefetch / 4).max(1),
            consumed: 0,
            finished: false,
        }
    }
}
