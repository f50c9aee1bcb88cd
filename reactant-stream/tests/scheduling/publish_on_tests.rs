// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use reactant_core::ReactantError;
use reactant_runtime::{single_threaded, single_threaded_with_config, SchedulerConfig};
use reactant_stream::Flux;
use reactant_test_utils::{test_error, PublisherProbe, TestSubscriber};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_signals_are_delivered_on_the_scheduler() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded_with_config(SchedulerConfig::new("deliver"))?;
    let threads = Arc::new(Mutex::new(HashSet::new()));
    let recorder = threads.clone();
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(0, 10)
        .publish_on(scheduler.clone())
        .do_on_next(move |_| {
            let name = std::thread::current().name().map(str::to_string);
            recorder.lock().insert(name);
        })
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), (0..10).collect::<Vec<_>>());
    let threads = threads.lock();
    assert_eq!(threads.len(), 1);
    assert_eq!(
        threads.iter().next().cloned().flatten().as_deref(),
        Some("deliver-1")
    );

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_order_and_demand_are_preserved_across_the_boundary() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<i64>::one_by_one();

    // Act
    Flux::range(0, 500)
        .publish_on_with_prefetch(scheduler.clone(), 16)
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), (0..500).collect::<Vec<_>>());
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_prefetch_bounds_upstream_demand() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let source = PublisherProbe::wrap(Flux::range(0, 1_000).as_publisher());
    let probe = TestSubscriber::<i64>::new(0);

    // Act
    Flux::from_shared(source.clone())
        .publish_on_with_prefetch(scheduler.clone(), 8)
        .subscribe(probe.clone());
    std::thread::sleep(Duration::from_millis(30));

    // Assert
    assert_eq!(source.requested(), 8);
    assert_eq!(source.item_count(), 8);
    assert!(probe.values().is_empty());

    probe.request(6);
    assert!(probe.await_values(6, WAIT));
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(source.requested(), 14);

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_error_follows_queued_items() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::concat(vec![Flux::range(0, 3), Flux::error(test_error("late"))])
        .publish_on(scheduler.clone())
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), vec![0, 1, 2]);
    assert!(matches!(probe.error(), Some(ReactantError::UpstreamFailure(_))));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_disposed_scheduler_fails_the_sequence() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    scheduler.dispose();
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(0, 3)
        .publish_on(scheduler)
        .subscribe(probe.clone());

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::SchedulerRejected { .. })
    ));
    assert!(probe.values().is_empty());
    Ok(())
}

#[test]
fn test_cancel_stops_delivery() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<u64>::cancelling_after(3);

    // Act
    Flux::interval(Duration::from_millis(2), scheduler.clone())
        .on_backpressure_drop()
        .publish_on(scheduler.clone())
        .subscribe(probe.clone());

    // Assert
    assert!(probe.await_values(3, WAIT));
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(probe.value_count(), 3);
    assert!(!probe.is_terminated());

    scheduler.dispose();
    Ok(())
}
