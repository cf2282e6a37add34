//! Controller configuration.

use std::time::Duration;

use gale_workqueue::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};

/// Default number of worker loops.
pub const DEFAULT_WORKERS: usize = 5;

/// Default retry cap per key.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Tunables for the reconciliation engine.
///
/// Explicit configuration rather than embedded literals, so tests can run
/// small pools with low retry limits.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of concurrent worker loops.
    pub workers: usize,
    /// Consecutive failures per key before giving up.
    pub max_retries: u32,
    /// Backoff delay for a key's first retry.
    pub backoff_base: Duration,
    /// Ceiling on any retry delay.
    pub backoff_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BASE_DELAY,
            backoff_max: DEFAULT_MAX_DELAY,
        }
    }
}

impl ControllerConfig {
    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the retry cap.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff window.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }
}
