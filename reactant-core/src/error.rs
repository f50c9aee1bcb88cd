// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the Reactant reactive engine
//!
//! Every failure that travels through a pipeline is a [`ReactantError`] delivered via
//! `on_error`. Variants are grouped into the coarse [`ErrorKind`] taxonomy so callers can
//! tell protocol bugs apart from data-source failures and timeouts.
//!
//! # Examples
//!
//! ```
//! use reactant_core::{ErrorKind, ReactantError, Result};
//!
//! fn parse(input: &str) -> Result<i32> {
//!     input
//!         .parse::<i32>()
//!         .map_err(ReactantError::upstream)
//! }
//!
//! let err = parse("nope").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
//! ```

use std::any::Any;
use std::sync::Arc;

/// Coarse classification of a [`ReactantError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A Reactive Streams rule was broken (bad demand, double subscribe, late signal).
    ContractViolation,
    /// The data source, a user callback or a scheduler task failed.
    UpstreamFailure,
    /// A time bound elapsed before the expected signal arrived.
    Timeout,
    /// A blocking wait was abandoned through its cancellation token.
    ///
    /// Cancellation is never delivered through `on_error`.
    Cancelled,
}

/// Root error type for all Reactant operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReactantError {
    /// `request(n)` was called with a non-positive amount.
    #[error("Illegal demand: request({requested}) must be positive")]
    IllegalDemand {
        /// The offending amount
        requested: u64,
    },

    /// A single-subscriber source was subscribed to more than once.
    #[error("Multiple subscriptions are not supported by this source")]
    MultipleSubscriptions,

    /// A signal was emitted after the sequence had already terminated.
    #[error("Signal after terminal: {signal}")]
    SignalAfterTerminal {
        /// Name of the late signal
        signal: &'static str,
    },

    /// Error raised by a data source or a user-provided function.
    #[error("Upstream failure: {0}")]
    UpstreamFailure(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// Stream processing failed for a reason described by `context`.
    #[error("Stream processing error: {context}")]
    StreamProcessing {
        /// Description of what went wrong
        context: String,
    },

    /// A user callback or scheduled task panicked.
    #[error("Panicked: {context}")]
    Panicked {
        /// The panic payload, rendered as text
        context: String,
    },

    /// A time-bound operator elapsed.
    #[error("Timeout error: {context}")]
    Timeout {
        /// Context about the timeout (e.g. duration)
        context: String,
    },

    /// A bounded buffer or a demand-less producer could not hold another item.
    #[error("Backpressure overflow: {context}")]
    Overflow {
        /// Which buffer overflowed
        context: String,
    },

    /// A scheduler refused work, usually because it was disposed.
    #[error("Scheduler '{scheduler}' rejected the task")]
    SchedulerRejected {
        /// Name of the scheduler
        scheduler: String,
    },

    /// A blocking wait was cancelled before any terminal signal arrived.
    #[error("Cancelled before a terminal signal")]
    Cancelled,

    /// Several errors were collected (delay-error combinators).
    #[error("Multiple errors occurred: {count} errors")]
    Multiple {
        /// Number of errors that occurred
        count: usize,
        /// The individual errors
        errors: Vec<ReactantError>,
    },
}

impl ReactantError {
    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessing {
            context: context.into(),
        }
    }

    /// Create a timeout error with the given context
    pub fn timeout_error(context: impl Into<String>) -> Self {
        Self::Timeout {
            context: context.into(),
        }
    }

    /// Create an overflow error with the given context
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow {
            context: context.into(),
        }
    }

    /// Wrap an error raised by a source or a user function
    pub fn upstream(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UpstreamFailure(Arc::new(error))
    }

    /// Build the error for an illegal `request(n)` call
    pub const fn illegal_demand(requested: u64) -> Self {
        Self::IllegalDemand { requested }
    }

    /// Convert a caught panic payload into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let context = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { context }
    }

    /// Aggregate errors collected by a delay-error combinator.
    ///
    /// A single error is returned unchanged.
    pub fn from_errors(mut errors: Vec<ReactantError>) -> Self {
        if errors.len() == 1 {
            if let Some(single) = errors.pop() {
                return single;
            }
        }
        Self::Multiple {
            count: errors.len(),
            errors,
        }
    }

    /// Map this error onto the engine's error taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalDemand { .. }
            | Self::MultipleSubscriptions
            | Self::SignalAfterTerminal { .. } => ErrorKind::ContractViolation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UpstreamFailure(_)
            | Self::StreamProcessing { .. }
            | Self::Panicked { .. }
            | Self::Overflow { .. }
            | Self::SchedulerRejected { .. }
            | Self::Multiple { .. } => ErrorKind::UpstreamFailure,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::IllegalDemand { .. } => "illegal_demand",
            Self::MultipleSubscriptions => "multiple_subscriptions",
            Self::SignalAfterTerminal { .. } => "signal_after_terminal",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::StreamProcessing { .. } => "stream_processing",
            Self::Panicked { .. } => "panicked",
            Self::Timeout { .. } => "timeout",
            Self::Overflow { .. } => "overflow",
            Self::SchedulerRejected { .. } => "scheduler_rejected",
            Self::Cancelled => "cancelled",
            Self::Multiple { .. } => "multiple",
        }
    }

    /// Returns `true` for Reactive Streams rule violations.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self.kind(), ErrorKind::ContractViolation)
    }
}

/// Specialized Result type for Reactant operations
pub type Result<T> = std::result::Result<T, ReactantError>;

/// Extension trait for converting foreign errors into `ReactantError`
pub trait IntoReactantError {
    /// Convert this error into an upstream failure
    fn into_reactant(self) -> ReactantError;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoReactantError for E {
    fn into_reactant(self) -> ReactantError {
        ReactantError::upstream(self)
    }
}

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Replace the error with a stream processing error carrying `context`.
    ///
    /// # Errors
    /// Returns `Err(ReactantError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReactantError::StreamProcessing {
            context: format!("{}: {e}", context.into()),
        })
    }
}
