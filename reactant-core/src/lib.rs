// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Reactant core
//!
//! Protocol primitives shared by every Reactant crate: the [`Publisher`],
//! [`Subscriber`] and [`Subscription`] traits, the [`Signal`] union, demand
//! accounting, and the error type delivered through `on_error`.
//!
//! Operators never share mutable state across stage boundaries; everything
//! flows through the signal protocol defined here.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod arbiter;
pub mod cancellation_token;
pub mod demand;
pub mod error;
pub mod panic;
pub mod protocol;
pub mod signal;
pub mod upstream;

pub use self::arbiter::SubscriptionArbiter;
pub use self::cancellation_token::CancellationToken;
pub use self::demand::{Demand, DEFAULT_PREFETCH, UNBOUNDED};
pub use self::error::{ErrorKind, IntoReactantError, ReactantError, Result, ResultExt};
pub use self::panic::catch_panic;
pub use self::protocol::{
    EmptySubscription, Publisher, PublisherRef, Subscriber, SubscriberRef, Subscription,
    SubscriptionRef,
};
pub use self::signal::Signal;
pub use self::upstream::UpstreamSlot;
