// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Outstanding-demand accounting.
//!
//! Demand is a non-negative counter per subscription. `request(n)` adds to it
//! (saturating at [`UNBOUNDED`]), every delivered item subtracts one. Once unbounded,
//! the counter never decreases again.

use crate::error::{ReactantError, Result};
use core::sync::atomic::{AtomicU64, Ordering};

/// Demand sentinel meaning "emit as fast as you like".
pub const UNBOUNDED: u64 = u64::MAX;

/// Default number of items an operator requests from an inner or upstream source.
pub const DEFAULT_PREFETCH: usize = 32;

/// Adds two demands, saturating at [`UNBOUNDED`].
#[must_use]
pub const fn add_cap(a: u64, b: u64) -> u64 {
    a.saturating_add(b)
}

/// Rejects non-positive demand.
///
/// # Errors
/// Returns [`ReactantError::IllegalDemand`] when `n == 0`.
pub fn validate(n: u64) -> Result<()> {
    if n == 0 {
        Err(ReactantError::illegal_demand(n))
    } else {
        Ok(())
    }
}

/// Atomic outstanding-demand counter.
///
/// Besides bookkeeping, the transition from zero to non-zero in [`Demand::add`] is used by
/// sources as a "who drains" decision: the caller that observes a previous value of zero
/// owns the emission loop.
#[derive(Debug, Default)]
pub struct Demand {
    requested: AtomicU64,
}

impl Demand {
    /// A counter with no outstanding demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requested: AtomicU64::new(0),
        }
    }

    /// Current outstanding demand.
    pub fn get(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Returns `true` once demand reached the unbounded sentinel.
    pub fn is_unbounded(&self) -> bool {
        self.get() == UNBOUNDED
    }

    /// Adds `n`, saturating. Returns the value observed before the addition.
    pub fn add(&self, n: u64) -> u64 {
        match self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != UNBOUNDED).then(|| add_cap(current, n))
            }) {
            Ok(previous) | Err(previous) => previous,
        }
    }

    /// Records `n` delivered items. Returns the remaining demand.
    ///
    /// Unbounded demand stays unbounded.
    pub fn produced(&self, n: u64) -> u64 {
        match self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != UNBOUNDED).then(|| current - n.min(current))
            }) {
            Ok(previous) => previous - n.min(previous),
            Err(unbounded) => unbounded,
        }
    }

    /// Consumes one unit of demand if any is available.
    pub fn try_take_one(&self) -> bool {
        self.requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match current {
                0 => None,
                UNBOUNDED => Some(UNBOUNDED),
                n => Some(n - 1),
            })
            .is_ok()
    }
}
