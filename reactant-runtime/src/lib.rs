// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Schedulers: explicit, shareable places where pipeline work runs.
//!
//! Nothing here is global. A scheduler is constructed at startup, handed to the
//! operators that need it (`subscribe_on`, `publish_on`, `interval`, `timeout`), and
//! disposed at shutdown.
//!
//! ```rust
//! use reactant_runtime::{parallel, Scheduler};
//! use std::sync::mpsc;
//!
//! # fn main() -> reactant_core::Result<()> {
//! let scheduler = parallel(2)?;
//! let (tx, rx) = mpsc::channel();
//! scheduler.schedule(Box::new(move || tx.send(21 * 2).unwrap()))?;
//! assert_eq!(rx.recv().unwrap(), 42);
//! scheduler.dispose();
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod logging;

pub mod config;
pub mod impls;
pub mod scheduler;
pub mod task;

pub use config::SchedulerConfig;
pub use impls::bounded_elastic::BoundedElasticScheduler;
pub use impls::parallel::ParallelScheduler;
pub use impls::single::SingleScheduler;
pub use scheduler::{
    bounded_elastic, bounded_elastic_with_config, parallel, parallel_with_config,
    single_threaded, single_threaded_with_config, Job, PeriodicJob, Scheduler, SchedulerRef,
};
pub use task::TaskHandle;
