// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::flux::Flux;
use reactant_core::{
    demand, EmptySubscription, Publisher, PublisherRef, ReactantError, Subscriber, SubscriberRef,
    Subscription, SubscriptionArbiter, SubscriptionRef,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NO_WINNER: usize = usize::MAX;
const CANCELLED: usize = usize::MAX - 1;

struct RacePublisher<T> {
    sources: Vec<PublisherRef<T>>,
}

impl<T: Send + 'static> Publisher<T> for RacePublisher<T> {
    fn subscribe(&self, subscriber: SubscriberRef<T>) {
        if self.sources.is_empty() {
            EmptySubscription::complete(&subscriber);
            return;
        }
        let coordinator = Arc::new(RaceCoordinator {
            actual: subscriber.clone(),
            lanes: (0..self.sources.len())
                .map(|_| SubscriptionArbiter::new())
                .collect(),
            winner: AtomicUsize::new(NO_WINNER),
        });
        subscriber.on_subscribe(coordinator.clone());
        for (index, source) in self.sources.iter().enumerate() {
            if coordinator.winner.load(Ordering::Acquire) != NO_WINNER {
                break;
            }
            source.subscribe(Arc::new(RaceSubscriber {
                parent: coordinator.clone(),
                index,
            }));
        }
    }
}

/// Forwards the signals of whichever source signals first.
///
/// Until a winner exists, downstream requests reach every source. The first `on_next`,
/// `on_error` or `on_complete` claims the race and cancels every other source.
struct RaceCoordinator<T> {
    actual: SubscriberRef<T>,
    lanes: Vec<SubscriptionArbiter>,
    winner: AtomicUsize,
}

impl<T: Send + 'static> RaceCoordinator<T> {
    fn try_win(&self, index: usize) -> bool {
        match self
            .winner
            .compare_exchange(NO_WINNER, index, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                for (other, lane) in self.lanes.iter().enumerate() {
                    if other != index {
                        lane.cancel();
                    }
                }
                true
            }
            Err(current) => current == index,
        }
    }
}

impl<T: Send + 'static> Subscription for RaceCoordinator<T> {
    fn request(&self, n: u64) {
        if let Err(error) = demand::validate(n) {
            if self.winner.swap(CANCELLED, Ordering::AcqRel) != CANCELLED {
                self.lanes.iter().for_each(SubscriptionArbiter::cancel);
                self.actual.on_error(error);
            }
            return;
        }
        match self.winner.load(Ordering::Acquire) {
            CANCELLED => {}
            NO_WINNER => self.lanes.iter().for_each(|lane| lane.request(n)),
            index => self.lanes[index].request(n),
        }
    }

    fn cancel(&self) {
        self.winner.store(CANCELLED, Ordering::Release);
        self.lanes.iter().for_each(SubscriptionArbiter::cancel);
    }
}

struct RaceSubscriber<T> {
    parent: Arc<RaceCoordinator<T>>,
    index: usize,
}

impl<T: Send + 'static> Subscriber<T> for RaceSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef) {
        self.parent.lanes[self.index].set(subscription);
    }

    fn on_next(&self, item: T) {
        if self.parent.try_win(self.index) {
            self.parent.actual.on_next(item);
        } else {
            self.parent.lanes[self.index].cancel();
        }
    }

    fn on_error(&self, error: ReactantError) {
        if self.parent.try_win(self.index) {
            self.parent.lanes[self.index].release();
            self.parent.actual.on_error(error);
        } else {
            debug!("error from a losing race source ignored: {}", error);
        }
    }

    fn on_complete(&self) {
        if self.parent.try_win(self.index) {
            self.parent.lanes[self.index].release();
            self.parent.actual.on_complete();
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Mirrors the first of `sources` to emit any signal and cancels the others.
    ///
    /// An empty list completes immediately.
    pub fn race(sources: Vec<Flux<T>>) -> Self {
        Self::from_publisher(RacePublisher {
            sources: sources.iter().map(Flux::as_publisher).collect(),
        })
    }
}
