// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::channel::oneshot;
use reactant_core::ReactantError;
use reactant_runtime::single_threaded;
use reactant_stream::Mono;
use reactant_test_utils::{test_error, TestSubscriber};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_from_future_completes_with_output() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let mono = Mono::<i32>::from_future(async { Ok(21 * 2) }, scheduler.clone());
    let probe = TestSubscriber::<i32>::unbounded();

    // Act
    mono.subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), vec![42]);
    assert!(probe.is_completed());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_from_future_serves_only_the_first_subscriber() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let mono = Mono::from_future(async { Ok("once") }, scheduler.clone());
    let first = TestSubscriber::<&str>::unbounded();
    let second = TestSubscriber::<&str>::unbounded();

    // Act
    mono.subscribe(first.clone());
    mono.subscribe(second.clone());

    // Assert
    assert!(first.await_terminal(WAIT));
    assert_eq!(first.values(), vec!["once"]);
    assert!(matches!(
        second.error(),
        Some(ReactantError::MultipleSubscriptions)
    ));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_from_async_builds_a_future_per_subscription() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mono = Mono::from_async(
        move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(call) }
        },
        scheduler.clone(),
    );
    let first = TestSubscriber::<usize>::unbounded();
    let second = TestSubscriber::<usize>::unbounded();

    // Act
    mono.subscribe(first.clone());
    mono.subscribe(second.clone());

    // Assert
    assert!(first.await_terminal(WAIT));
    assert!(second.await_terminal(WAIT));
    assert_eq!(first.values(), vec![0]);
    assert_eq!(second.values(), vec![1]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    scheduler.dispose();
    Ok(())
}

async fn explode() -> reactant_core::Result<i32> {
    panic!("future blew up");
}

#[test]
fn test_failing_and_panicking_futures_become_errors() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let failed = TestSubscriber::<i32>::unbounded();
    let panicked = TestSubscriber::<i32>::unbounded();

    // Act
    Mono::<i32>::from_future(async { Err(test_error("io")) }, scheduler.clone())
        .subscribe(failed.clone());
    Mono::from_future(explode(), scheduler.clone()).subscribe(panicked.clone());

    // Assert
    assert!(failed.await_terminal(WAIT));
    assert!(panicked.await_terminal(WAIT));
    assert!(matches!(
        failed.error(),
        Some(ReactantError::UpstreamFailure(_))
    ));
    assert!(matches!(
        panicked.error(),
        Some(ReactantError::Panicked { context }) if context == "future blew up"
    ));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_cancelled_future_result_is_never_delivered() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let (tx, rx) = oneshot::channel::<i32>();
    let mono = Mono::from_future(
        async move { rx.await.map_err(|_| test_error("sender dropped")) },
        scheduler.clone(),
    );
    let probe = TestSubscriber::<i32>::unbounded();
    mono.subscribe(probe.clone());

    // Act
    probe.cancel();
    let _ = tx.send(9);

    // Assert
    assert!(!probe.await_terminal(Duration::from_millis(50)));
    assert!(probe.values().is_empty());

    scheduler.dispose();
    Ok(())
}
