// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the Reactant reactive engine.
//!
//! This crate is for development and testing only. It depends on nothing but
//! `reactant-core`, so every other crate in the workspace can use it as a
//! dev-dependency.
//!
//! # Key Types
//!
//! - [`TestSubscriber`] records every signal it receives, checks the protocol rules
//!   (demand never exceeded, nothing after a terminal signal, no overlapping `on_next`)
//!   and can block until the sequence terminates.
//! - [`PublisherProbe`] wraps a publisher and records subscriptions, requests and
//!   cancellations crossing it.
//! - [`FlakySource`] fails its first `k` subscriptions and then emits its values.
//!
//! ```rust
//! use reactant_core::Publisher;
//! use reactant_test_utils::{FlakySource, TestSubscriber};
//!
//! let source = FlakySource::new(1, vec!["ok"]);
//!
//! let first = TestSubscriber::<&str>::unbounded();
//! source.subscribe(first.clone());
//! assert_eq!(first.errors().len(), 1);
//!
//! let second = TestSubscriber::<&str>::unbounded();
//! source.subscribe(second.clone());
//! assert_eq!(second.values(), vec!["ok"]);
//! assert!(second.is_completed());
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub mod fixtures;
pub mod flaky;
pub mod probe;
pub mod test_subscriber;

pub use fixtures::{test_error, FixtureError};
pub use flaky::FlakySource;
pub use probe::PublisherProbe;
pub use test_subscriber::TestSubscriber;
