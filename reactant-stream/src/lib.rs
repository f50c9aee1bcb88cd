// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Reactant stream
//!
//! Cold, backpressured sequences: [`Flux`] for zero or more items and [`Mono`] for at
//! most one, together with their sources and operator stages.
//!
//! Every stage is a [`Publisher`](reactant_core::Publisher) that subscribes to its
//! upstream when a subscriber arrives. Signals travel synchronously on the calling
//! thread unless a scheduler-bound operator (`subscribe_on`, `publish_on`, `interval`,
//! `timeout`) moves them elsewhere.
//!
//! ```
//! use reactant_stream::Flux;
//! use reactant_test_utils::TestSubscriber;
//!
//! let probe = TestSubscriber::<i64>::unbounded();
//! Flux::merge(vec![Flux::range(0, 2), Flux::range(10, 2)])
//!     .collect_list()
//!     .map(|items| items.len() as i64)
//!     .subscribe(probe.clone());
//!
//! assert_eq!(probe.values(), vec![4]);
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod backpressure;
pub mod flux;
pub mod mono;
pub mod operator;
pub mod source;

pub use backpressure::OverflowStrategy;
pub use flux::Flux;
pub use mono::Mono;
pub use operator::DEFAULT_CONCURRENCY;
pub use source::create::{FluxSink, MonoSink};
