// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Operator stages. Each module adds its operators to [`Flux`](crate::Flux) through an
//! inherent `impl` block; `Mono` delegates to the same stages.

pub mod flat_map;
pub mod fold;
pub(crate) mod handle;
pub mod on_error;
pub mod peek;
pub mod publish_on;
pub mod race;
pub mod retry;
pub mod subscribe_on;
pub mod timeout;
pub mod zip;

pub use flat_map::DEFAULT_CONCURRENCY;
