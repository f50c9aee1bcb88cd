// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::{
    catch_panic, Publisher, ReactantError, Subscriber, SubscriptionRef, UpstreamSlot, UNBOUNDED,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct DisposeState {
    upstream: UpstreamSlot,
    disposed: AtomicBool,
}

/// Handle to a callback subscription.
///
/// Dropping a `Disposable` does not cancel anything; call [`dispose`](Self::dispose).
#[derive(Clone)]
pub struct Disposable {
    state: Arc<DisposeState>,
}

impl Disposable {
    /// Cancels the subscription. Idempotent.
    pub fn dispose(&self) {
        self.state.disposed.store(true, Ordering::Release);
        self.state.upstream.cancel();
    }

    /// Returns `true` once disposed or once the sequence terminated.
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

struct CallbackSubscriber<T, N, E, C> {
    state: Arc<DisposeState>,
    on_next: N,
    on_error: Option<E>,
    on_complete: Option<C>,
    _item: std::marker::PhantomData<fn(T)>,
}

impl<T, N, E, C> CallbackSubscriber<T, N, E, C>
where
    E: Fn(ReactantError),
{
    fn fail(&self, error: ReactantError) {
        match &self.on_error {
            Some(handler) => {
                if let Err(panic) = catch_panic(|| handler(error)) {
                    error!("error handler panicked: {}", panic);
                }
            }
            None => error!(
                "fatal error with no error handler, subscription terminated: {}",
                error
            ),
        }
    }
}

impl<T, N, E, C> Subscriber<T> for CallbackSubscriber<T, N, E, C>
where
    T: Send + 'static,
    N: Fn(T) + Send + Sync + 'static,
    E: Fn(ReactantError) + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
{
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if self.state.upstream.set_once(subscription.clone()) {
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&self, item: T) {
        if self.state.disposed.load(Ordering::Acquire) {
            debug!("item dropped: subscription disposed");
            return;
        }
        if let Err(panic) = catch_panic(|| (self.on_next)(item)) {
            if !self.state.disposed.swap(true, Ordering::AcqRel) {
                self.state.upstream.cancel();
                self.fail(panic);
            }
        }
    }

    fn on_error(&self, error: ReactantError) {
        self.state.upstream.close();
        if self.state.disposed.swap(true, Ordering::AcqRel) {
            debug!("error dropped after dispose: {}", error);
            return;
        }
        self.fail(error);
    }

    fn on_complete(&self) {
        self.state.upstream.close();
        if self.state.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handler) = &self.on_complete {
            if let Err(panic) = catch_panic(handler) {
                error!("completion handler panicked: {}", panic);
            }
        }
    }
}

/// Callback-based subscription for any publisher.
pub trait SubscribeExt<T>: Publisher<T> {
    /// Subscribes with callbacks and requests everything.
    ///
    /// A panicking `on_next` cancels the subscription and is reported as
    /// `ReactantError::Panicked` to `on_error`. Without an error handler an error is
    /// fatal to the subscription. It is logged at error level and the subscription is
    /// disposed.
    ///
    /// ```
    /// use reactant_core::ReactantError;
    /// use reactant_exec::SubscribeExt;
    /// use reactant_stream::Flux;
    /// use std::sync::atomic::{AtomicI64, Ordering};
    /// use std::sync::Arc;
    ///
    /// let total = Arc::new(AtomicI64::new(0));
    /// let sum = total.clone();
    /// let disposable = Flux::range(1, 4).subscribe_with(
    ///     move |x| {
    ///         sum.fetch_add(x, Ordering::SeqCst);
    ///     },
    ///     None::<fn(ReactantError)>,
    ///     None::<fn()>,
    /// );
    ///
    /// assert_eq!(total.load(Ordering::SeqCst), 10);
    /// assert!(disposable.is_disposed());
    /// ```
    fn subscribe_with<N, E, C>(
        &self,
        on_next: N,
        on_error: Option<E>,
        on_complete: Option<C>,
    ) -> Disposable
    where
        N: Fn(T) + Send + Sync + 'static,
        E: Fn(ReactantError) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static;
}

impl<T, P> SubscribeExt<T> for P
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    fn subscribe_with<N, E, C>(
        &self,
        on_next: N,
        on_error: Option<E>,
        on_complete: Option<C>,
    ) -> Disposable
    where
        N: Fn(T) + Send + Sync + 'static,
        E: Fn(ReactantError) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        let state = Arc::new(DisposeState {
            upstream: UpstreamSlot::new(),
            disposed: AtomicBool::new(false),
        });
        self.subscribe(Arc::new(CallbackSubscriber {
            state: state.clone(),
            on_next,
            on_error,
            on_complete,
            _item: std::marker::PhantomData,
        }));
        Disposable { state }
    }
}
