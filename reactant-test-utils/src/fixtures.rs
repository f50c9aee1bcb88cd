// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error fixtures for injecting failures into pipelines under test.

use reactant_core::ReactantError;

/// A domain error as user code would raise it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixtureError {
    /// A source failed on its own.
    #[error("source failed: {0}")]
    Source(String),
    /// A transform rejected an item.
    #[error("rejected item {0}")]
    Rejected(i64),
}

/// A `ReactantError::UpstreamFailure` wrapping [`FixtureError::Source`].
pub fn test_error(message: &str) -> ReactantError {
    ReactantError::upstream(FixtureError::Source(message.to_string()))
}
