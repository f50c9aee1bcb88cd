// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::Duration;

/// Sizing and naming for a pooled scheduler.
///
/// ```rust
/// use reactant_runtime::SchedulerConfig;
/// use std::time::Duration;
///
/// let config = SchedulerConfig::new("io")
///     .max_threads(16)
///     .keep_alive(Duration::from_secs(30));
/// assert_eq!(config.name, "io");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Prefix for worker thread names; also used in log lines.
    pub name: String,
    /// Worker count for `parallel`, thread cap for `bounded_elastic`. Ignored by `single_threaded`.
    pub max_threads: usize,
    /// How long an idle elastic thread lingers before it is released.
    pub keep_alive: Duration,
}

impl SchedulerConfig {
    /// Default sizing under a custom name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the thread count or cap.
    #[must_use]
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the idle keep-alive of elastic threads.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "reactant".to_string(),
            max_threads: std::thread::available_parallelism().map_or(4, |n| n.get()),
            keep_alive: Duration::from_secs(60),
        }
    }
}
