// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use reactant_core::{Publisher, ReactantError, SubscriberRef};
use reactant_runtime::{single_threaded, single_threaded_with_config, SchedulerConfig};
use reactant_stream::{Flux, Mono};
use reactant_test_utils::{PublisherProbe, TestSubscriber};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

struct ExplodingSource;

impl Publisher<i32> for ExplodingSource {
    fn subscribe(&self, _subscriber: SubscriberRef<i32>) {
        panic!("subscribe exploded");
    }
}

#[test]
fn test_subscription_happens_on_the_scheduler() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded_with_config(SchedulerConfig::new("subscriber"))?;
    let subscribed_on = Arc::new(Mutex::new(None));
    let recorder = subscribed_on.clone();
    let probe = TestSubscriber::<i32>::unbounded();

    // Act
    Flux::defer(move || {
        *recorder.lock() = std::thread::current().name().map(str::to_string);
        Flux::just(1)
    })
    .subscribe_on(scheduler.clone())
    .subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), vec![1]);
    assert_eq!(subscribed_on.lock().as_deref(), Some("subscriber-1"));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_early_requests_are_held_until_subscribed() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<i64>::new(2);

    // Act
    Flux::range(0, 5)
        .subscribe_on(scheduler.clone())
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_values(2, WAIT));
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(probe.values(), vec![0, 1]);
    assert!(!probe.is_completed());

    probe.request(3);
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), vec![0, 1, 2, 3, 4]);
    assert!(probe.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_panic_while_subscribing_becomes_an_error() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<i32>::unbounded();

    // Act
    Flux::from_publisher(ExplodingSource)
        .subscribe_on(scheduler.clone())
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert!(matches!(
        probe.error(),
        Some(ReactantError::Panicked { context }) if context == "subscribe exploded"
    ));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_rejected_subscription_fails_immediately() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    scheduler.dispose();
    let probe = TestSubscriber::<&str>::unbounded();

    // Act
    Mono::just("unreachable")
        .subscribe_on(scheduler)
        .subscribe(probe.clone());

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::SchedulerRejected { .. })
    ));
    Ok(())
}

#[test]
fn test_cancel_before_the_task_runs_skips_the_subscription() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let (release_tx, release_rx) = mpsc::channel::<()>();
    scheduler.schedule(Box::new(move || {
        let _ = release_rx.recv_timeout(WAIT);
    }))?;
    let source = PublisherProbe::wrap(Flux::range(0, 3).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();
    Flux::from_shared(source.clone())
        .subscribe_on(scheduler.clone())
        .subscribe(probe.clone());

    // Act
    probe.cancel();
    release_tx.send(())?;
    let (done_tx, done_rx) = mpsc::channel::<()>();
    scheduler.schedule(Box::new(move || {
        let _ = done_tx.send(());
    }))?;
    done_rx.recv_timeout(WAIT)?;

    // Assert
    assert_eq!(source.subscription_count(), 0);
    assert!(probe.values().is_empty());
    assert!(!probe.is_terminated());

    scheduler.dispose();
    Ok(())
}
