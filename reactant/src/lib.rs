// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Reactant
//!
//! A reactive-streams engine: cold [`Flux`] and [`Mono`] pipelines with request-driven
//! backpressure, composable operators, and schedulers that say explicitly where work
//! runs.
//!
//! ## Overview
//!
//! - A [`Publisher`] produces signals for a [`Subscriber`] only after the subscriber asked
//!   for them through its [`Subscription`]. Nothing happens until something subscribes.
//! - Operators (`map`, `filter`, `flat_map`, `zip`, `merge`, `retry`, `timeout`, ...) are
//!   publishers wrapping publishers. Demand flows up the chain, items flow down.
//! - Schedulers ([`single_threaded`], [`bounded_elastic`], [`parallel`]) are handed to
//!   `subscribe_on`, `publish_on`, `interval` and `timeout`; no operator picks a thread on
//!   its own.
//! - Errors are values ([`ReactantError`]) delivered through `on_error`. A panic in a user
//!   callback becomes `ReactantError::Panicked`.
//!
//! ## Quick Start
//!
//! ```rust
//! use reactant::prelude::*;
//!
//! let evens = Flux::range(1, 5)
//!     .filter(|x| x % 2 == 0)
//!     .map(|x| x * 10)
//!     .collect_list()
//!     .block();
//!
//! assert!(matches!(evens, Ok(Some(ref v)) if v == &vec![20, 40]));
//! ```
//!
//! ## Moving work between threads
//!
//! ```rust
//! use reactant::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> reactant::Result<()> {
//! let io = bounded_elastic(4)?;
//! let compute = parallel(2)?;
//!
//! let total = Flux::range(0, 100)
//!     .subscribe_on(io.clone())
//!     .publish_on(compute.clone())
//!     .map(|x| x * 2)
//!     .timeout(Duration::from_secs(5), compute.clone())
//!     .reduce(|a, b| a + b)
//!     .block()?;
//!
//! assert_eq!(total, Some(9_900));
//! io.dispose();
//! compute.dispose();
//! # Ok(())
//! # }
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub use reactant_core::{
    CancellationToken, ErrorKind, Publisher, PublisherRef, ReactantError, Result, Signal,
    Subscriber, SubscriberRef, Subscription, SubscriptionRef, DEFAULT_PREFETCH, UNBOUNDED,
};
pub use reactant_exec::{
    BlockExt, BlockingExt, Disposable, IntoFutureExt, SignalStream, SubscribeExt,
    TerminalFuture, ToStreamExt,
};
pub use reactant_runtime::{
    bounded_elastic, bounded_elastic_with_config, parallel, parallel_with_config,
    single_threaded, single_threaded_with_config, Scheduler, SchedulerConfig, SchedulerRef,
    TaskHandle,
};
pub use reactant_stream::{Flux, FluxSink, Mono, MonoSink, OverflowStrategy, DEFAULT_CONCURRENCY};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        bounded_elastic, parallel, single_threaded, BlockExt, BlockingExt, CancellationToken,
        Flux, IntoFutureExt, Mono, OverflowStrategy, ReactantError, Scheduler, SchedulerRef,
        SubscribeExt, ToStreamExt,
    };
}
