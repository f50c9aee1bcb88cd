// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::SchedulerConfig;
use crate::impls::bounded_elastic::BoundedElasticScheduler;
use crate::impls::parallel::ParallelScheduler;
use crate::impls::single::SingleScheduler;
use crate::task::TaskHandle;
use core::fmt::Debug;
use futures::future::BoxFuture;
use reactant_core::Result;
use std::sync::Arc;
use std::time::Duration;

/// A unit of work run once.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work run on every period.
pub type PeriodicJob = Box<dyn FnMut() + Send + 'static>;

/// "A place work runs".
///
/// Implementations are internally synchronized: any number of pipelines may submit work
/// concurrently. A job that panics is logged and discarded; the scheduler stays usable.
/// Operators that need the failure to reach a subscriber catch it themselves and turn it
/// into `on_error`.
///
/// Every submission returns `Err(SchedulerRejected)` once the scheduler is disposed.
pub trait Scheduler: Send + Sync + Debug {
    /// Name used for worker threads and log lines.
    fn name(&self) -> &str;

    /// Run `job` as soon as a worker is free.
    ///
    /// # Errors
    /// Returns `SchedulerRejected` if the scheduler is disposed.
    fn schedule(&self, job: Job) -> Result<TaskHandle>;

    /// Run `job` once `delay` has elapsed.
    ///
    /// # Errors
    /// Returns `SchedulerRejected` if the scheduler is disposed.
    fn schedule_delayed(&self, delay: Duration, job: Job) -> Result<TaskHandle>;

    /// Run `job` after `initial_delay`, then every `period`, until the handle is cancelled.
    ///
    /// Runs of the same periodic job never overlap.
    ///
    /// # Errors
    /// Returns `SchedulerRejected` if the scheduler is disposed, or a stream processing
    /// error when `period` is zero.
    fn schedule_periodically(
        &self,
        initial_delay: Duration,
        period: Duration,
        job: PeriodicJob,
    ) -> Result<TaskHandle>;

    /// Drive `future` to completion on this scheduler.
    ///
    /// # Errors
    /// Returns `SchedulerRejected` if the scheduler is disposed.
    fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<TaskHandle>;

    /// Stop accepting work and release the worker threads. Idempotent.
    fn dispose(&self);

    /// Returns `true` once disposed.
    fn is_disposed(&self) -> bool;
}

/// Shared handle to a scheduler.
pub type SchedulerRef = Arc<dyn Scheduler>;

/// A scheduler with one reusable worker; all submitted work is serialized.
///
/// # Errors
/// Returns an error if the worker thread cannot be started.
pub fn single_threaded() -> Result<SchedulerRef> {
    single_threaded_with_config(SchedulerConfig::new("single"))
}

/// [`single_threaded`] with an explicit configuration.
///
/// # Errors
/// Returns an error if the worker thread cannot be started.
pub fn single_threaded_with_config(config: SchedulerConfig) -> Result<SchedulerRef> {
    Ok(Arc::new(SingleScheduler::new(config)?))
}

/// A scheduler for blocking work: threads are created on demand up to `max_threads` and
/// released after sitting idle.
///
/// # Errors
/// Returns an error if `max_threads` is zero or the pool cannot be built.
pub fn bounded_elastic(max_threads: usize) -> Result<SchedulerRef> {
    bounded_elastic_with_config(SchedulerConfig::new("bounded-elastic").max_threads(max_threads))
}

/// [`bounded_elastic`] with an explicit configuration.
///
/// # Errors
/// Returns an error if `config.max_threads` is zero or the pool cannot be built.
pub fn bounded_elastic_with_config(config: SchedulerConfig) -> Result<SchedulerRef> {
    Ok(Arc::new(BoundedElasticScheduler::new(config)?))
}

/// A fixed pool of `worker_count` workers for CPU-bound work.
///
/// # Errors
/// Returns an error if `worker_count` is zero or the pool cannot be built.
pub fn parallel(worker_count: usize) -> Result<SchedulerRef> {
    parallel_with_config(SchedulerConfig::new("parallel").max_threads(worker_count))
}

/// [`parallel`] with an explicit configuration.
///
/// # Errors
/// Returns an error if `config.max_threads` is zero or the pool cannot be built.
pub fn parallel_with_config(config: SchedulerConfig) -> Result<SchedulerRef> {
    Ok(Arc::new(ParallelScheduler::new(config)?))
}
