// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::ReactantError;
use reactant_stream::Flux;
use reactant_test_utils::{PublisherProbe, TestSubscriber};

#[test]
fn test_range_emits_only_what_was_requested() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(2);

    // Act
    Flux::range(1, 5).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert!(!probe.is_completed());

    probe.request(3);
    assert_eq!(probe.values(), vec![1, 2, 3, 4, 5]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_range_completes_eagerly_after_last_item() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(3);

    // Act
    Flux::range(10, 3).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![10, 11, 12]);
    assert!(probe.is_completed());
    Ok(())
}

#[test]
fn test_range_overflow_is_an_error() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(i64::MAX, 2).subscribe(probe.clone());

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::StreamProcessing { .. })
    ));
    assert!(probe.values().is_empty());
    Ok(())
}

#[test]
fn test_empty_iterable_completes_without_demand() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i32>::new(0);

    // Act
    Flux::from_iter(Vec::<i32>::new()).subscribe(probe.clone());

    // Assert
    assert!(probe.is_completed());
    assert!(probe.values().is_empty());
    Ok(())
}

#[test]
fn test_from_iter_is_cold() -> anyhow::Result<()> {
    // Arrange
    let flux = Flux::from_iter(vec!["a", "b"]);
    let first = TestSubscriber::<&str>::unbounded();
    let second = TestSubscriber::<&str>::unbounded();

    // Act
    flux.subscribe(first.clone());
    flux.subscribe(second.clone());

    // Assert
    assert_eq!(first.values(), vec!["a", "b"]);
    assert_eq!(second.values(), vec!["a", "b"]);
    Ok(())
}

#[test]
fn test_from_iterator_rejects_second_subscriber() -> anyhow::Result<()> {
    // Arrange
    let flux = Flux::from_iterator(vec![1, 2, 3].into_iter());
    let first = TestSubscriber::<i32>::unbounded();
    let second = TestSubscriber::<i32>::unbounded();

    // Act
    flux.subscribe(first.clone());
    flux.subscribe(second.clone());

    // Assert
    assert_eq!(first.values(), vec![1, 2, 3]);
    assert!(matches!(
        second.error(),
        Some(ReactantError::MultipleSubscriptions)
    ));
    Ok(())
}

#[test]
fn test_cancel_mid_emission_stops_before_exhausting() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 100).as_publisher());
    let probe = TestSubscriber::<i64>::cancelling_after(2);

    // Act
    Flux::from_shared(source.clone()).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert!(!probe.is_terminated());
    assert_eq!(source.item_count(), 2);
    assert!(source.was_cancelled());
    Ok(())
}

#[test]
fn test_request_zero_signals_illegal_demand() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(0);
    Flux::range(1, 3).subscribe(probe.clone());

    // Act
    probe.request(0);

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::IllegalDemand { requested: 0 })
    ));
    assert!(probe.values().is_empty());
    Ok(())
}

#[test]
fn test_just_emits_one_item() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<String>::unbounded();

    // Act
    Flux::just("hello".to_string()).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec!["hello".to_string()]);
    assert!(probe.is_completed());
    Ok(())
}
