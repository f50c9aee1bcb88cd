// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::CancellationToken;
use tokio::task::AbortHandle;

/// Cancellable handle to work submitted to a [`Scheduler`](crate::Scheduler).
///
/// Cancelling a task that has not started yet prevents it from running; a delayed or
/// periodic task stops before its next run. A task already running is asked to stop at
/// its next await point and is otherwise left to finish.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    token: CancellationToken,
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    pub(crate) fn new(token: CancellationToken, abort: AbortHandle) -> Self {
        Self {
            token,
            abort: Some(abort),
        }
    }

    /// A handle that is already cancelled and owns no work.
    pub fn cancelled() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token, abort: None }
    }

    /// Cancel the task. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `true` once the task ran to completion or was torn down.
    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().map_or(true, AbortHandle::is_finished)
    }
}
