// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::ReactantError;
use reactant_runtime::single_threaded;
use reactant_stream::Flux;
use reactant_test_utils::{PublisherProbe, TestSubscriber};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn is_zero_demand(error: Option<ReactantError>) -> bool {
    matches!(error, Some(ReactantError::IllegalDemand { requested: 0 }))
}

#[test]
fn test_zero_request_fails_flat_map() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 100).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone())
        .flat_map(Flux::just)
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.values().is_empty());
    assert!(source.was_cancelled());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_zip() -> anyhow::Result<()> {
    // Arrange
    let left = PublisherProbe::wrap(Flux::range(0, 100).as_publisher());
    let right = PublisherProbe::wrap(Flux::range(100, 100).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::zip(
        vec![Flux::from_shared(left.clone()), Flux::from_shared(right.clone())],
        |row| row.iter().sum::<i64>(),
    )
    .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(left.was_cancelled());
    assert!(right.was_cancelled());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_race_before_a_winner() -> anyhow::Result<()> {
    // Arrange
    let first = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let second = PublisherProbe::wrap(Flux::range(10, 10).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::race(vec![
        Flux::from_shared(first.clone()),
        Flux::from_shared(second.clone()),
    ])
    .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);
    subscriber.request(1);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.values().is_empty());
    assert!(first.was_cancelled());
    assert!(second.was_cancelled());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_create() -> anyhow::Result<()> {
    // Arrange
    let flux = Flux::create(|sink| {
        for i in 0..3 {
            let _ = sink.next(i);
        }
    });
    let subscriber = TestSubscriber::<i32>::new(0);
    flux.subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert!(subscriber.values().is_empty());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_range_between_requests() -> anyhow::Result<()> {
    // Arrange
    let subscriber = TestSubscriber::<i64>::new(2);
    Flux::range(0, 10).subscribe(subscriber.clone());

    // Act
    subscriber.request(0);
    subscriber.request(3);

    // Assert
    assert_eq!(subscriber.values(), vec![0, 1]);
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_retry_without_resubscribing() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone())
        .retry(3)
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert_eq!(source.subscription_count(), 1);
    assert!(source.was_cancelled());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_bypasses_on_error_return() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone())
        .on_error_return(-1)
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);
    subscriber.request(5);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.values().is_empty());
    assert!(source.was_cancelled());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_bypasses_on_error_resume() -> anyhow::Result<()> {
    // Arrange
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::range(0, 10)
        .on_error_resume(|_| Flux::range(100, 3))
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    assert!(subscriber.values().is_empty());
    assert!(subscriber.violations().is_empty());
    Ok(())
}

#[test]
fn test_zero_request_fails_publish_on() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::range(0, 10)
        .publish_on(scheduler.clone())
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(subscriber.await_terminal(WAIT));
    assert!(is_zero_demand(subscriber.error()));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.values().is_empty());
    assert!(subscriber.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_zero_request_fails_subscribe_on() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone())
        .subscribe_on(scheduler.clone())
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(subscriber.await_terminal(WAIT));
    assert!(is_zero_demand(subscriber.error()));
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(subscriber.errors().len(), 1);
    assert_eq!(source.item_count(), 0);
    assert!(subscriber.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_zero_request_fails_timeout_and_disarms_the_timer() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let subscriber = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone())
        .timeout(Duration::from_millis(100), scheduler.clone())
        .subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(is_zero_demand(subscriber.error()));
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(source.was_cancelled());
    assert!(subscriber.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_zero_request_fails_interval_and_stops_the_timer() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let subscriber = TestSubscriber::<u64>::new(0);
    Flux::interval(Duration::from_millis(50), scheduler.clone()).subscribe(subscriber.clone());

    // Act
    subscriber.request(0);

    // Assert
    assert!(subscriber.await_terminal(WAIT));
    assert!(is_zero_demand(subscriber.error()));
    std::thread::sleep(Duration::from_millis(120));
    assert_eq!(subscriber.errors().len(), 1);
    assert!(subscriber.values().is_empty());
    assert!(subscriber.violations().is_empty());

    scheduler.dispose();
    Ok(())
}
