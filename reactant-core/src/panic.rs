// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ReactantError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, turning a panic into [`ReactantError::Panicked`].
///
/// Used at every boundary where user code runs inside the signal path, so that a
/// misbehaving callback surfaces as `on_error` instead of unwinding through `on_next`.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(ReactantError::from_panic)
}
