// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::SchedulerConfig;
use crate::impls::common::{JobMode, WorkerPool};
use crate::scheduler::{Job, PeriodicJob, Scheduler};
use crate::task::TaskHandle;
use futures::future::BoxFuture;
use reactant_core::{ReactantError, Result};
use std::time::Duration;

/// Threads for blocking work, created on demand up to a cap and released when idle.
///
/// Jobs run on the blocking pool; timers and futures run on a single async driver thread.
/// Work submitted while every thread is busy waits in the pool's queue.
#[derive(Debug)]
pub struct BoundedElasticScheduler {
    pool: WorkerPool,
}

impl BoundedElasticScheduler {
    /// Build a pool capped at `config.max_threads` blocking threads.
    ///
    /// # Errors
    /// Returns an error if the cap is zero or the pool cannot be built.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        if config.max_threads == 0 {
            return Err(ReactantError::stream_error(
                "bounded elastic scheduler needs a thread cap of at least one",
            ));
        }
        Ok(Self {
            pool: WorkerPool::multi_threaded(
                &config.name,
                1,
                config.max_threads,
                config.keep_alive,
                JobMode::Blocking,
            )?,
        })
    }
}

impl Scheduler for BoundedElasticScheduler {
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
