// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ReactantError;
use crate::protocol::{Subscriber, SubscriptionRef};
use std::fmt;

/// One protocol signal, as a value.
///
/// Stages that buffer or re-deliver signals (`publish_on`, test recorders) store them in
/// this form. After `Error` or `Complete` no further signal may follow on the same
/// subscription.
pub enum Signal<T> {
    /// The subscription handed to the subscriber
    Subscribe(SubscriptionRef),
    /// An item
    Next(T),
    /// Terminal failure
    Error(ReactantError),
    /// Terminal success
    Complete,
}

impl<T> Signal<T> {
    /// Returns `true` for `Error` and `Complete`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Signal::Error(_) | Signal::Complete)
    }

    /// Returns `true` for `Next`.
    pub const fn is_next(&self) -> bool {
        matches!(self, Signal::Next(_))
    }

    /// Name of the signal as it appears in the protocol.
    pub const fn name(&self) -> &'static str {
        match self {
            Signal::Subscribe(_) => "on_subscribe",
            Signal::Next(_) => "on_next",
            Signal::Error(_) => "on_error",
            Signal::Complete => "on_complete",
        }
    }

    /// Converts into the carried item, discarding other signals.
    pub fn into_next(self) -> Option<T> {
        match self {
            Signal::Next(item) => Some(item),
            _ => None,
        }
    }

    /// Borrows the carried error, if any.
    pub const fn error(&self) -> Option<&ReactantError> {
        match self {
            Signal::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Delivers this signal to `subscriber`.
    pub fn deliver(self, subscriber: &dyn Subscriber<T>) {
        match self {
            Signal::Subscribe(subscription) => subscriber.on_subscribe(subscription),
            Signal::Next(item) => subscriber.on_next(item),
            Signal::Error(error) => subscriber.on_error(error),
            Signal::Complete => subscriber.on_complete(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Subscribe(_) => f.write_str("Subscribe"),
            Signal::Next(item) => f.debug_tuple("Next").field(item).finish(),
            Signal::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Signal::Complete => f.write_str("Complete"),
        }
    }
}

impl<T: Clone> Clone for Signal<T> {
    fn clone(&self) -> Self {
        match self {
            Signal::Subscribe(subscription) => Signal::Subscribe(subscription.clone()),
            Signal::Next(item) => Signal::Next(item.clone()),
            Signal::Error(error) => Signal::Error(error.clone()),
            Signal::Complete => Signal::Complete,
        }
    }
}

impl<T: PartialEq> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Signal::Next(a), Signal::Next(b)) => a == b,
            (Signal::Complete, Signal::Complete) => true,
            _ => false, // Errors and subscriptions are never equal
        }
    }
}
