// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use reactant_core::ReactantError;
use reactant_runtime::single_threaded;
use reactant_stream::{Flux, Mono};
use reactant_test_utils::{test_error, PublisherProbe, TestSubscriber};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_flat_map_flattens_inner_sequences() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 3)
        .flat_map(|x| Flux::range(x * 10, 2))
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![10, 11, 20, 21, 30, 31]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_flat_map_respects_downstream_demand() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::new(3);

    // Act
    Flux::range(1, 4)
        .flat_map(|x| Flux::range(x * 100, 5))
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.value_count(), 3);
    assert!(!probe.is_completed());

    probe.request(100);
    assert_eq!(probe.value_count(), 20);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_flat_map_fails_fast_on_inner_error() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 5).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .flat_map(|x| {
            if x == 3 {
                Flux::error(test_error("inner failed"))
            } else {
                Flux::just(x)
            }
        })
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2]);
    assert!(matches!(probe.error(), Some(ReactantError::UpstreamFailure(_))));
    assert!(source.was_cancelled());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_flat_map_delay_error_collects_errors_until_the_end() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 6)
        .flat_map_delay_error(
            |x| {
                if x % 3 == 0 {
                    Flux::error(test_error(&format!("bad {x}")))
                } else {
                    Flux::just(x)
                }
            },
            4,
        )
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1, 2, 4, 5]);
    assert!(matches!(
        probe.error(),
        Some(ReactantError::Multiple { count: 2, .. })
    ));
    assert_eq!(probe.errors().len(), 1);
    Ok(())
}

#[test]
fn test_flat_map_delay_error_with_one_error_reports_it_unwrapped() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 3)
        .flat_map_delay_error(
            |x| {
                if x == 1 {
                    Flux::error(test_error("first"))
                } else {
                    Flux::just(x)
                }
            },
            2,
        )
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![2, 3]);
    assert!(matches!(probe.error(), Some(ReactantError::UpstreamFailure(_))));
    Ok(())
}

#[test]
fn test_mapper_panic_fails_the_sequence() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 3)
        .flat_map(|x| {
            if x == 2 {
                panic!("no inner for 2");
            }
            Flux::just(x)
        })
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![1]);
    assert!(matches!(probe.error(), Some(ReactantError::Panicked { .. })));
    Ok(())
}

#[test]
fn test_max_concurrency_bounds_active_inners() -> anyhow::Result<()> {
    // Arrange
    let source = PublisherProbe::wrap(Flux::range(1, 10).as_publisher());
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::from_shared(source.clone())
        .flat_map_with(|_| Flux::<i64>::never(), 3, 8)
        .subscribe(probe.clone());

    // Assert
    assert_eq!(source.requested(), 3);
    assert_eq!(source.item_count(), 3);
    assert!(!probe.is_terminated());
    Ok(())
}

#[test]
fn test_concat_map_preserves_source_order() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let timer = scheduler.clone();
    let delayed = move |x: i64| {
        let delay = Duration::from_millis((4 - x) as u64 * 40);
        Mono::delay(delay, timer.clone()).flux().map(move |_| x)
    };
    let concatenated = TestSubscriber::<i64>::unbounded();
    let merged = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::range(1, 3)
        .concat_map(delayed.clone())
        .subscribe(concatenated.clone());
    Flux::range(1, 3)
        .flat_map(delayed)
        .subscribe(merged.clone());

    // Assert
    assert!(concatenated.await_terminal(WAIT));
    assert!(merged.await_terminal(WAIT));
    assert_eq!(concatenated.values(), vec![1, 2, 3]);
    assert_eq!(merged.values(), vec![3, 2, 1]);

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_cancel_reaches_every_active_inner() -> anyhow::Result<()> {
    // Arrange
    let cancelled = Arc::new(AtomicUsize::new(0));
    let counter = cancelled.clone();
    let source = PublisherProbe::wrap(Flux::range(1, 3).as_publisher());
    let probe = TestSubscriber::<i64>::new(1);
    Flux::from_shared(source.clone())
        .flat_map(move |_| {
            let counter = counter.clone();
            Flux::<i64>::never().do_on_cancel(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .subscribe(probe.clone());

    // Act
    probe.cancel();

    // Assert
    assert_eq!(cancelled.load(Ordering::SeqCst), 3);
    assert!(!probe.is_terminated());
    Ok(())
}

#[test]
fn test_merge_interleaves_all_sources() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::merge(vec![
        Flux::range(0, 2),
        Flux::range(10, 3),
        Flux::range(20, 4),
    ])
    .subscribe(probe.clone());

    // Assert
    let mut values = probe.values();
    values.sort_unstable();
    assert_eq!(values, vec![0, 1, 10, 11, 12, 20, 21, 22, 23]);
    assert!(probe.is_completed());
    assert!(probe.violations().is_empty());
    Ok(())
}

#[test]
fn test_merge_of_nothing_completes() -> anyhow::Result<()> {
    // Arrange
    let probe = TestSubscriber::<i64>::unbounded();

    // Act
    Flux::<i64>::merge(Vec::new()).subscribe(probe.clone());

    // Assert
    assert!(probe.is_completed());
    Ok(())
}

#[test]
fn test_concat_runs_sources_in_turn() -> anyhow::Result<()> {
    // Arrange
    let second = PublisherProbe::wrap(Flux::range(10, 2).as_publisher());
    let probe = TestSubscriber::<i64>::new(2);

    // Act
    Flux::concat(vec![Flux::range(0, 2), Flux::from_shared(second.clone())])
        .subscribe(probe.clone());

    // Assert
    assert_eq!(probe.values(), vec![0, 1]);
    probe.request(2);
    assert_eq!(probe.values(), vec![0, 1, 10, 11]);
    assert!(probe.is_completed());
    assert_eq!(second.subscription_count(), 1);
    Ok(())
}
