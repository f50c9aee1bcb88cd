// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Side-effect hooks observing the signals that cross a stage.

use crate::flux::Flux;
use reactant_core::{
    catch_panic, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef, Subscription,
    SubscriptionRef, UpstreamSlot,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type NextHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ReactantError) + Send + Sync>;
type SignalHook = Arc<dyn Fn() + Send + Sync>;
type RequestHook = Arc<dyn Fn(u64) + Send + Sync>;

struct Hooks<T> {
    on_subscribe: Option<SignalHook>,
    on_next: Option<NextHook<T>>,
    on_error: Option<ErrorHook>,
    on_complete: Option<SignalHook>,
    on_request: Option<RequestHook>,
    on_cancel: Option<SignalHook>,
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            on_subscribe: None,
            on_next: None,
            on_error: None,
            on_complete: None,
            on_request: None,
            on_cancel: None,
        }
    }
}

// Failures in request/cancel hooks cannot reach the subscriber through the protocol
fn run_quietly(hook: &SignalHook, name: &str) {
    if let Err(error) = catch_panic(|| hook()) {
        warn!("{} hook panicked: {}", name, error);
    }
}

struct PeekPublisher<T> {
    source: PublisherRef<T>,
    hooks: Arc<Hooks<T>>,
}

impl<T: Send + 'static> Publisher<T> for PeekPublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        self.source.subscribe(Arc::new(PeekSubscriber {
            actual: subscriber,
            hooks: self.hooks.clone(),
            upstream: Arc::new(UpstreamSlot::new()),
            done: AtomicBool::new(false),
        }));
    }
}

struct PeekSubscriber<T> {
    actual: SubscriberRef<T>,
    hooks: Arc<Hooks<T>>,
    upstream: Arc<UpstreamSlot>,
    done: AtomicBool,
}

struct PeekSubscription<T> {
    upstream: Arc<UpstreamSlot>,
    hooks: Arc<Hooks<T>>,
}

impl<T: Send + 'static> Subscription for PeekSubscription<T> {
    fn request(&self, n: u64) {
        if let Some(hook) = &self.hooks.on_request {
            if let Err(error) = catch_panic(|| hook(n)) {
                warn!("on_request hook panicked: {}", error);
            }
        }
        self.upstream.request(n);
    }

    fn cancel(&self) {
        if let Some(hook) = &self.hooks.on_cancel {
            run_quietly(hook, "on_cancel");
        }
        self.upstream.cancel();
    }
}

impl<T: Send + 'static> PeekSubscriber<T> {
    fn fail(&self, error: ReactantError) {
        if self.done.swap(true, Ordering::AcqRel) {
            warn!("error dropped after terminal signal: {}", error);
            return;
        }
        self.actual.on_error(error);
    }
}

impl<T: Send + 'static> Subscriber<T> for PeekSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        if !self.upstream.set_once(subscription) {
            return;
        }
        let hooks = &self.hooks;
        let downstream: SubscriptionRef = if hooks.on_request.is_some() || hooks.on_cancel.is_some()
        {
            Arc::new(PeekSubscription {
                upstream: self.upstream.clone(),
                hooks: self.hooks.clone(),
            })
        } else {
            match self.upstream.get() {
                Some(upstream) => upstream,
                None => return,
            }
        };
        let hook_result = match &hooks.on_subscribe {
            Some(hook) => catch_panic(|| hook()),
            None => Ok(()),
        };
        self.actual.on_subscribe(downstream);
        if let Err(error) = hook_result {
            self.upstream.cancel();
            self.fail(error);
        }
    }

    fn on_next(&self, item: T) {
        if self.done.load(Ordering::Acquire) {
            return;
        }
        if let Some(hook) = &self.hooks.on_next {
            if let Err(error) = catch_panic(|| hook(&item)) {
                self.upstream.cancel();
                self.fail(error);
                return;
            }
        }
        self.actual.on_next(item);
    }

    fn on_error(&self, error: ReactantError) {
        self.upstream.close();
        if let Some(hook) = &self.hooks.on_error {
            if let Err(panic) = catch_panic(|| hook(&error)) {
                warn!("on_error hook panicked: {}", panic);
            }
        }
        self.fail(error);
    }

    fn on_complete(&self) {
        self.upstream.close();
        if let Some(hook) = &self.hooks.on_complete {
            if let Err(error) = catch_panic(|| hook()) {
                self.fail(error);
                return;
            }
        }
        if !self.done.swap(true, Ordering::AcqRel) {
            self.actual.on_complete();
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    fn peek(self, configure: impl FnOnce(&mut Hooks<T>)) -> Self {
        let mut hooks = Hooks::default();
        configure(&mut hooks);
        Self::from_publisher(PeekPublisher {
            source: self.as_publisher(),
            hooks: Arc::new(hooks),
        })
    }

    /// Runs `hook` on every item before forwarding it.
    ///
    /// A panicking hook cancels upstream and fails the sequence.
    pub fn do_on_next<F>(self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_next = Some(Arc::new(hook)))
    }

    /// Runs `hook` on the error before forwarding it.
    pub fn do_on_error<F>(self, hook: F) -> Self
    where
        F: Fn(&ReactantError) + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_error = Some(Arc::new(hook)))
    }

    /// Runs `hook` before forwarding completion.
    pub fn do_on_complete<F>(self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_complete = Some(Arc::new(hook)))
    }

    /// Runs `hook` when the downstream cancels.
    pub fn do_on_cancel<F>(self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_cancel = Some(Arc::new(hook)))
    }

    /// Runs `hook` with every amount the downstream requests.
    pub fn do_on_request<F>(self, hook: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_request = Some(Arc::new(hook)))
    }

    /// Runs `hook` when the subscription is established.
    pub fn do_on_subscribe<F>(self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.peek(|hooks| hooks.on_subscribe = Some(Arc::new(hook)))
    }

    /// Logs every signal crossing this point at info level, tagged with `category`.
    pub fn log(self, category: impl Into<String>) -> Self
    where
        T: fmt::Debug,
    {
        let category: Arc<str> = Arc::from(category.into());
        self.peek(|hooks| {
            let tag = category.clone();
            hooks.on_subscribe = Some(Arc::new(move || info!("[{}] on_subscribe", tag)));
            let tag = category.clone();
            hooks.on_next = Some(Arc::new(move |item: &T| info!("[{}] on_next({:?})", tag, item)));
            let tag = category.clone();
            hooks.on_error = Some(Arc::new(move |error: &ReactantError| {
                info!("[{}] on_error({})", tag, error);
            }));
            let tag = category.clone();
            hooks.on_complete = Some(Arc::new(move || info!("[{}] on_complete", tag)));
            let tag = category.clone();
            hooks.on_request = Some(Arc::new(move |n: u64| info!("[{}] request({})", tag, n)));
            let tag = category;
            hooks.on_cancel = Some(Arc::new(move || info!("[{}] cancel", tag)));
        })
    }
}
