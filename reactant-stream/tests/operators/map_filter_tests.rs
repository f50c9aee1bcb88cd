// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::ReactantError;
use reactant_stream::Flux;
use reactant_test_utils::{test_error, PublisherProbe, TestSubscriber};

#[test]
fn test_filter_then_map() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 5)
        .filter(|x| x % 2 == 0)
        .map(|x| x * 10)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![20, 40]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_filter_replenishes_rejected_items() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 20).as_publisher());
    let probe = TestSubscriber::<i64>::new(2);

    // Act
    Flux::from_shared(source.clone())
        .filter(|x| x % 5 == 0)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![5, 10]);
    assert!(!probe.is_completed());
    assert_eq!(source.item_count(), 10);
    assert_eq!(source.requested(), 10);
    Ok(())
}

#[test]
fn test_map_panic_on_third_item() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 5).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .map(|x| {
            if x == 3 {
                panic!("mapper failed on {x}");
            }
            x
        })
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert_eq!(probe.errors().len(), 1);
    assert!(matches!(
        probe.error(),
        Some(ReactantError::Panicked { context }) if context == "mapper failed on 3"
    ));
    assert!(!probe.is_completed());
    assert!(source.was_cancelled());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_try_map_error_cancels_upstream() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 5).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .try_map(|x| if x < 2 { Ok(x) } else { Err(test_error("rejected")) })
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1]);
    assert!(matches!(probe.error(), Some(ReactantError::UpstreamFailure(_))));
    assert_eq!(source.item_count(), 2);
    assert!(source.was_cancelled());
    Ok(())
}

#[test]
fn test_take_cancels_upstream_after_n_items() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 1_000_000).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .take(3)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![0, 1, 2]);
    assert!(probe.is_completed());
    assert_eq!(source.item_count(), 3);
    assert!(source.was_cancelled());
    Ok(())
}

#[test]
fn test_take_zero_completes_without_subscribing_upstream() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .take(0)
        .subscribe(probe.clone());

    // Assert
    assert!(probe.is_completed());
    assert!(probe.values().is_empty());
    assert_eq!(source.subscription_count(), 0);
    Ok(())
}

#[test]
fn test_skip_drops_leading_items_and_honours_demand() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::one_by_one();

    // Act
    Flux::range(1, 6).skip(4).subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![5, 6]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_take_while_stops_at_first_rejected_item() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 10)
        .take_while(|x| *x < 4)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2, 3]);
    assert!(probe.is_completed());
    Ok(())
}

#[test]
fn test_errors_pass_through_map_and_filter() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<String>::unbounded();

    // Act
    Flux::<i64>::error(test_error("upstream down"))
        .filter(|_| true)
        .map(|x| x.to_string())
        .subscribe(probe.clone());

    // Assert
    assert!(probe.values().is_empty());
    assert_eq!(
        probe.error().map(|e| e.to_string()),
        Some("Upstream failure: source failed: upstream down".to_string())
    );
    Ok(())
}
