// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_stream::Flux;
use reactant_test_utils::{PublisherProbe, TestSubscriber};

#[test]
fn test_random_requests_never_overshoot_demand() -> anyhow::Result<()> {
    // Arrange
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let probe = TestSubscriber::<i64>::new(0);
    Flux::range(0, 200)
        .filter(|x| x % 3 != 0)
        .flat_map(|x| Flux::from_iter(vec![x, x * 2]))
        .subscribe(probe.clone());

    // Act
    let mut rounds = 0;
    while !probe.is_terminated() && rounds < 1_000 {
        let before = probe.value_count();
        let n = rng.u64(1..=7);
        probe.request(n);
        let delivered = probe.value_count() - before;
        assert!(delivered as u64 <= n);
        rounds += 1;
    }

    // Assert
    assert!(probe.is_completed());
    assert_eq!(probe.value_count(), 266);
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_delivered_never_exceeds_requested() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(5);

    // Act
    Flux::range(0, 100)
        .map(|x| x + 1)
        .skip(3)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![4, 5, 6, 7, 8]);
    assert!(!probe.is_completed());

    probe.request(2);
    assert_eq!(probe.value_count(), 7);
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_demand_accumulates_across_requests() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 50).as_publisher());
    let probe = TestSubscriber::<i64>::new(0);
    Flux::from_shared(source.clone()).subscribe(probe.clone());

    // Act
    probe.request(3);
    probe.request(4);

    // Assert
    assert_eq!(source.requested(), 7);
    assert_eq!(probe.values(), (0..7).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_unbounded_demand_saturates() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(0, 10).as_publisher());
    let probe = TestSubscriber::<i64>::new(u64::MAX - 1);
    Flux::from_shared(source.clone()).subscribe(probe.clone());

    // Act
    probe.request(u64::MAX);

    // Assert
    assert_eq!(probe.value_count(), 10);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_one_by_one_consumer_drives_a_chain() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 30).as_publisher());
    let probe = TestSubscriber::<i64>::one_by_one();

    // Act
    Flux::from_shared(source.clone())
        .filter(|x| x % 2 == 0)
        .map(|x| x * 10)
        .take(4)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![20, 40, 60, 80]);
    assert!(probe.is_completed());
    assert!(source.item_count() <= 9);
    assert!(source.was_cancelled());
    assert!(probe.violations().is_empty());
    Ok(())
}
