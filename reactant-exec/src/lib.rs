// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Reactant exec
//!
//! Terminal consumers for [`Flux`](reactant_stream::Flux) and
//! [`Mono`](reactant_stream::Mono): callback subscriptions returning a [`Disposable`],
//! blocking waits, and bridges into `async` code ([`TerminalFuture`], [`SignalStream`]).

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod blocking;
pub mod stream;
pub mod subscribe;
pub mod terminal;

pub use blocking::{BlockExt, BlockingExt};
pub use stream::{SignalStream, ToStreamExt};
pub use subscribe::{Disposable, SubscribeExt};
pub use terminal::{IntoFutureExt, TerminalFuture};
