// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Blocking boundary between a pipeline and synchronous code.
//!
//! These calls park the current thread until the sequence terminates. Never call them
//! from a scheduler worker that the pipeline itself needs, or the wait cannot end.

use crate::terminal::{Pick, TerminalFuture};
use futures::executor::block_on;
use futures::future::{select, Either};
use reactant_core::{CancellationToken, ReactantError, Result};
use reactant_stream::{Flux, Mono};
use std::pin::pin;

fn wait<T>(future: TerminalFuture<T>, token: Option<&CancellationToken>) -> Result<Option<T>> {
    let Some(token) = token else {
        return block_on(future);
    };
    block_on(async {
        let cancelled = pin!(token.cancelled());
        match select(future, cancelled).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(((), pending)) => {
                drop(pending);
                Err(ReactantError::Cancelled)
            }
        }
    })
}

/// Blocking accessors for a [`Flux`].
pub trait BlockingExt<T> {
    /// Waits for the first item and cancels the rest. `None` if the flux completed empty.
    ///
    /// # Errors
    /// Returns the error that terminated the sequence.
    fn block_first(&self) -> Result<Option<T>>;

    /// Waits for completion and returns the last item. `None` if the flux was empty.
    ///
    /// # Errors
    /// Returns the error that terminated the sequence.
    fn block_last(&self) -> Result<Option<T>>;

    /// Like [`block_first`](Self::block_first), giving up when `token` is cancelled.
    ///
    /// # Errors
    /// Returns `ReactantError::Cancelled` if `token` fired first, otherwise the error that
    /// terminated the sequence.
    fn block_first_until(&self, token: &CancellationToken) -> Result<Option<T>>;

    /// Like [`block_last`](Self::block_last), giving up when `token` is cancelled.
    ///
    /// # Errors
    /// Returns `ReactantError::Cancelled` if `token` fired first, otherwise the error that
    /// terminated the sequence.
    fn block_last_until(&self, token: &CancellationToken) -> Result<Option<T>>;
}

impl<T: Send + 'static> BlockingExt<T> for Flux<T> {
    fn block_first(&self) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::First), None)
    }

    fn block_last(&self) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::Last), None)
    }

    fn block_first_until(&self, token: &CancellationToken) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::First), Some(token))
    }

    fn block_last_until(&self, token: &CancellationToken) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::Last), Some(token))
    }
}

/// Blocking access to the value of a [`Mono`].
pub trait BlockExt<T> {
    /// Waits for the value. `None` if the mono completed empty.
    ///
    /// # Errors
    /// Returns the error that terminated the mono.
    ///
    /// ```
    /// use reactant_exec::BlockExt;
    /// use reactant_stream::Mono;
    ///
    /// let value = Mono::just(21).map(|x| x * 2).block();
    /// assert!(matches!(value, Ok(Some(42))));
    /// ```
    fn block(&self) -> Result<Option<T>>;

    /// Like [`block`](Self::block), giving up when `token` is cancelled.
    ///
    /// # Errors
    /// Returns `ReactantError::Cancelled` if `token` fired first, otherwise the error that
    /// terminated the mono.
    fn block_until(&self, token: &CancellationToken) -> Result<Option<T>>;
}

impl<T: Send + 'static> BlockExt<T> for Mono<T> {
    fn block(&self) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::Last), None)
    }

    fn block_until(&self, token: &CancellationToken) -> Result<Option<T>> {
        wait(TerminalFuture::subscribe(self, Pick::Last), Some(token))
    }
}
