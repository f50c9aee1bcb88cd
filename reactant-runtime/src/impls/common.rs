// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Worker pool shared by the tokio-backed schedulers.

use crate::scheduler::{Job, PeriodicJob};
use crate::task::TaskHandle;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use reactant_core::{catch_panic, CancellationToken, ReactantError, Result, ResultExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Where a job body executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobMode {
    /// On the async worker threads.
    Inline,
    /// On the blocking thread pool.
    Blocking,
}

#[derive(Debug, Clone)]
struct JobRunner {
    name: Arc<str>,
    mode: JobMode,
    handle: Handle,
}

impl JobRunner {
    fn run_now(name: &str, job: Job) {
        if let Err(error) = catch_panic(job) {
            error!("task on scheduler '{}' panicked: {}", name, error);
        }
    }

    fn run_periodic_now(name: &str, job: &mut PeriodicJob) {
        if let Err(error) = catch_panic(|| job()) {
            error!("periodic task on scheduler '{}' panicked: {}", name, error);
        }
    }

    async fn run(&self, job: Job) {
        match self.mode {
            JobMode::Inline => Self::run_now(&self.name, job),
            JobMode::Blocking => {
                let name = self.name.clone();
                let _ = self
                    .handle
                    .spawn_blocking(move || Self::run_now(&name, job))
                    .await;
            }
        }
    }

    async fn run_periodic(&self, mut job: PeriodicJob) -> Option<PeriodicJob> {
        match self.mode {
            JobMode::Inline => {
                Self::run_periodic_now(&self.name, &mut job);
                Some(job)
            }
            JobMode::Blocking => {
                let name = self.name.clone();
                self.handle
                    .spawn_blocking(move || {
                        Self::run_periodic_now(&name, &mut job);
                        job
                    })
                    .await
                    .ok()
            }
        }
    }
}

/// A tokio runtime plus the bookkeeping every scheduler needs.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    runner: JobRunner,
    runtime: Mutex<Option<Runtime>>,
    shutdown: CancellationToken,
    disposed: AtomicBool,
}

impl WorkerPool {
    /// Pool backed by a multi-threaded runtime.
    pub(crate) fn multi_threaded(
        name: &str,
        workers: usize,
        max_blocking: usize,
        keep_alive: Duration,
        mode: JobMode,
    ) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .max_blocking_threads(max_blocking)
            .thread_keep_alive(keep_alive)
            .thread_name_fn(thread_namer(name))
            .enable_time()
            .build()
            .context(format!("building scheduler '{name}'"))?;

        let handle = runtime.handle().clone();
        info!("scheduler '{}' started with {} workers", name, workers);
        Ok(Self {
            runner: JobRunner {
                name: Arc::from(name),
                mode,
                handle,
            },
            runtime: Mutex::new(Some(runtime)),
            shutdown: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        })
    }

    /// Pool backed by a current-thread runtime driven by one dedicated thread.
    pub(crate) fn dedicated_thread(name: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .context(format!("building scheduler '{name}'"))?;

        let handle = runtime.handle().clone();
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        std::thread::Builder::new()
            .name(format!("{name}-1"))
            .spawn(move || {
                runtime.block_on(stop.cancelled());
                // Pending tasks are dropped with the runtime
                drop(runtime);
            })
            .context(format!("starting worker thread for scheduler '{name}'"))?;

        info!("scheduler '{}' started with 1 worker", name);
        Ok(Self {
            runner: JobRunner {
                name: Arc::from(name),
                mode: JobMode::Inline,
                handle,
            },
            runtime: Mutex::new(None),
            shutdown,
            disposed: AtomicBool::new(false),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.runner.name
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_disposed() {
            warn!("scheduler '{}' is disposed; rejecting task", self.name());
            return Err(ReactantError::SchedulerRejected {
                scheduler: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn spawn_guarded<F>(&self, token: CancellationToken, body: F) -> TaskHandle
    where
        F: core::future::Future<Output = ()> + Send + 'static,
    {
        let guard = token.clone();
        let join = self.runner.handle.spawn(async move {
            tokio::select! {
                biased;
                () = guard.cancelled() => {}
                () = body => {}
            }
        });
        TaskHandle::new(token, join.abort_handle())
    }

    pub(crate) fn schedule(&self, job: Job) -> Result<TaskHandle> {
        self.ensure_active()?;
        let token = CancellationToken::new();
        let guard = token.clone();
        let name = self.runner.name.clone();

        let join = match self.runner.mode {
            JobMode::Inline => self.runner.handle.spawn(async move {
                if !guard.is_cancelled() {
                    JobRunner::run_now(&name, job);
                }
            }),
            JobMode::Blocking => self.runner.handle.spawn_blocking(move || {
                if !guard.is_cancelled() {
                    JobRunner::run_now(&name, job);
                }
            }),
        };
        Ok(TaskHandle::new(token, join.abort_handle()))
    }

    pub(crate) fn schedule_delayed(&self, delay: Duration, job: Job) -> Result<TaskHandle> {
        self.ensure_active()?;
        let runner = self.runner.clone();
        Ok(self.spawn_guarded(CancellationToken::new(), async move {
            sleep(delay).await;
            runner.run(job).await;
        }))
    }

    pub(crate) fn schedule_periodically(
        &self,
        initial_delay: Duration,
        period: Duration,
        job: PeriodicJob,
    ) -> Result<TaskHandle> {
        self.ensure_active()?;
        if period.is_zero() {
            return Err(ReactantError::stream_error(
                "periodic task period must be positive",
            ));
        }

        let runner = self.runner.clone();
        let token = CancellationToken::new();
        let guard = token.clone();
        Ok(self.spawn_guarded(token, async move {
            let mut ticker = interval_at(Instant::now() + initial_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut job = Some(job);
            while let Some(current) = job.take() {
                ticker.tick().await;
                if guard.is_cancelled() {
                    break;
                }
                job = runner.run_periodic(current).await;
            }
        }))
    }

    pub(crate) fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<TaskHandle> {
        self.ensure_active()?;
        Ok(self.spawn_guarded(CancellationToken::new(), future))
    }

    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.cancel();
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
        info!("scheduler '{}' disposed", self.name());
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn thread_namer(name: &str) -> impl Fn() -> String + Send + Sync + 'static {
    let name = name.to_string();
    let counter = AtomicUsize::new(0);
    move || format!("{}-{}", name, counter.fetch_add(1, Ordering::Relaxed) + 1)
}
