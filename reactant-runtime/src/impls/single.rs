// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::SchedulerConfig;
use crate::impls::common::WorkerPool;
use crate::scheduler::{Job, PeriodicJob, Scheduler};
use crate::task::TaskHandle;
use futures::future::BoxFuture;
use reactant_core::Result;
use std::time::Duration;

/// One reusable worker thread; submitted work never overlaps.
#[derive(Debug)]
pub struct SingleScheduler {
    pool: WorkerPool,
}

impl SingleScheduler {
    /// Start the worker thread.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be started.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::dedicated_thread(&config.name)?,
        })
    }
}

impl Scheduler for SingleScheduler {
    fn name(&self) -> &str {
        self.pool.name()
    }

    fn schedule(&self, job: Job) -> Result<TaskHandle> {
        self.pool.schedule(job)
    }

    fn schedule_delayed(&self, delay: Duration, job: Job) -> Result<TaskHandle> {
        self.pool.schedule_delayed(delay, job)
    }

    fn schedule_periodically(
        &self,
        initial_delay: Duration,
        period: Duration,
        job: PeriodicJob,
    ) -> Result<TaskHandle> {
        self.pool.schedule_periodically(initial_delay, period, job)
    }

    fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<TaskHandle> {
        self.pool.spawn(future)
    }

    fn dispose(&self) {
        self.pool.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.pool.is_disposed()
    }
}
