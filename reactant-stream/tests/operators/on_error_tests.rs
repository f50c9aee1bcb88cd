// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use reactant_core::{ErrorKind, ReactantError};
use reactant_stream::{Flux, Mono};
use reactant_test_utils::{test_error, TestSubscriber};
use std::sync::Arc;

fn failing_after_two() -> Flux<i64> {
    Flux::concat(vec![Flux::range(1, 2), Flux::error(test_error("primary"))])
}

#[test]
fn test_on_error_return_emits_fallback_and_completes() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    failing_after_two().on_error_return(-1).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2, -1]);
    assert!(probe.is_completed());
    assert!(probe.errors().is_empty());
    Ok(())
}

#[test]
fn test_on_error_resume_carries_unsatisfied_demand() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(3);

    // Act
    failing_after_two()
        .on_error_resume(|_| Flux::range(7, 2))
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2, 7]);
    assert!(!probe.is_completed());

    probe.request(1);
    assert_eq!(probe.values(), vec![1, 2, 7, 8]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_on_error_resume_sees_the_original_error() -> anyhow::Result<()> {
    // Arrange
    let seen = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    failing_after_two()
        .on_error_resume(move |error| {
            *recorder.lock() = Some(error.to_string());
            Flux::empty()
        })
        .subscribe(probe.clone());

    // Assert
    assert_eq!(
        seen.lock().as_deref(),
        Some("Upstream failure: source failed: primary")
    );
    assert!(probe.is_completed());
    Ok(())
}

#[test]
fn test_fallback_error_is_forwarded() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    failing_after_two()
        .on_error_resume(|_| Flux::error(ReactantError::timeout_error("fallback too slow")))
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert_eq!(probe.error().map(|e| e.kind()), Some(ErrorKind::Timeout));
    assert_eq!(probe.errors().len(), 1);
    Ok(())
}

#[test]
fn test_panicking_fallback_fails_the_sequence() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    failing_after_two()
        .on_error_resume(|_| panic!("no fallback"))
        .subscribe(probe.clone());

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::Panicked { context }) if context == "no fallback"
    ));
    Ok(())
}

#[test]
fn test_on_error_map_replaces_the_error() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    failing_after_two()
        .on_error_map(|error| ReactantError::stream_error(format!("wrapped: {error}")))
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert!(matches!(
        probe.error(),
        Some(ReactantError::StreamProcessing { context })
            if context == "wrapped: Upstream failure: source failed: primary"
    ));
    Ok(())
}

#[test]
fn test_completion_passes_through_untouched() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(0, 3).on_error_return(99).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![0, 1, 2]);
    assert!(probe.is_completed());
    Ok(())
}

#[test]
fn test_mono_on_error_return() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<&str>::unbounded();

    // Act
    Mono::<&str>::error(test_error("lookup failed"))
        .on_error_return("default")
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec!["default"]);
    assert!(probe.is_completed());
    Ok(())
}
