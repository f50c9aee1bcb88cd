// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use reactant_core::{CancellationToken, ReactantError, Subscriber, SubscriptionRef, UNBOUNDED};
use reactant_runtime::single_threaded;
use reactant_stream::{Flux, Mono};
use reactant_test_utils::TestSubscriber;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_interval_fails_when_a_tick_finds_no_demand() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<u64>::new(3);

    // Act
    Flux::interval(Duration::from_millis(5), scheduler.clone()).subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.values(), vec![0, 1, 2]);
    assert!(matches!(probe.error(), Some(ReactantError::Overflow { .. })));
    assert!(probe.violations().is_empty());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_interval_stops_ticking_once_cancelled() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<u64>::cancelling_after(4);

    // Act
    Flux::interval(Duration::from_millis(5), scheduler.clone()).subscribe(probe.clone());

    // Assert
    assert!(probe.await_values(4, WAIT));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(probe.values(), vec![0, 1, 2, 3]);
    assert!(!probe.is_terminated());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_interval_on_disposed_scheduler_is_rejected() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    scheduler.dispose();
    let probe = TestSubscriber::<u64>::unbounded();

    // Act
    Flux::interval(Duration::from_millis(5), scheduler).subscribe(probe.clone());

    // Assert
    assert!(matches!(
        probe.error(),
        Some(ReactantError::SchedulerRejected { .. })
    ));
    Ok(())
}

#[test]
fn test_delay_emits_zero_after_the_delay() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<u64>::unbounded();
    let started = Instant::now();

    // Act
    Mono::delay(Duration::from_millis(20), scheduler.clone()).subscribe(probe.clone());

    // Assert
    assert!(probe.await_terminal(WAIT));
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(probe.values(), vec![0]);
    assert!(probe.is_completed());

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_delay_cancelled_before_firing_emits_nothing() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let probe = TestSubscriber::<u64>::unbounded();
    Mono::delay(Duration::from_millis(30), scheduler.clone()).subscribe(probe.clone());

    // Act
    probe.cancel();

    // Assert
    assert!(!probe.await_terminal(Duration::from_millis(80)));
    assert!(probe.values().is_empty());

    scheduler.dispose();
    Ok(())
}

/// Requests everything and panics on every item.
struct PanickingConsumer {
    items: AtomicUsize,
    errors: Mutex<Vec<ReactantError>>,
    terminal: CancellationToken,
}

impl PanickingConsumer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            items: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
            terminal: CancellationToken::new(),
        })
    }
}

impl Subscriber<u64> for PanickingConsumer {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        subscription.request(UNBOUNDED);
    }

    fn on_next(&self, item: u64) {
        self.items.fetch_add(1, Ordering::SeqCst);
        panic!("consumer rejected {item}");
    }

    fn on_error(&self, error: ReactantError) {
        self.errors.lock().push(error);
        self.terminal.cancel();
    }

    fn on_complete(&self) {
        self.terminal.cancel();
    }
}

#[test]
fn test_interval_panicking_consumer_gets_error_and_timer_stops() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let consumer = PanickingConsumer::new();

    // Act
    Flux::interval(Duration::from_millis(5), scheduler.clone()).subscribe(consumer.clone());

    // Assert
    assert!(consumer.terminal.wait_timeout(WAIT));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(consumer.items.load(Ordering::SeqCst), 1);
    let errors = consumer.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ReactantError::Panicked { .. }));

    scheduler.dispose();
    Ok(())
}

#[test]
fn test_delay_panicking_consumer_gets_error() -> anyhow::Result<()> {
    // Arrange
    let scheduler = single_threaded()?;
    let consumer = PanickingConsumer::new();

    // Act
    Mono::delay(Duration::from_millis(10), scheduler.clone()).subscribe(consumer.clone());

    // Assert
    assert!(consumer.terminal.wait_timeout(WAIT));
    assert_eq!(consumer.items.load(Ordering::SeqCst), 1);
    let errors = consumer.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ReactantError::Panicked { .. }));

    scheduler.dispose();
    Ok(())
}
