//! Per-item exponential backoff.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;

/// Base delay for the first retry of an item.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);

/// Ceiling no per-item delay ever exceeds.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

/// Tracks consecutive failures per item and computes the next retry delay.
///
/// The delay doubles with every consecutive failure, starting at `base`
/// and capped at `max`. Counters only reset via [`RateLimiter::forget`].
#[derive(Debug)]
pub struct RateLimiter<T> {
    base: Duration,
    max: Duration,
    failures: Mutex<HashMap<T, u32>>,
}

impl<T> RateLimiter<T>
where
    T: Clone + Eq + Hash,
{
    /// Create a rate limiter with the given base delay and ceiling.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Create a rate limiter with the default delays.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    /// Delay to apply before the next delivery of `item`, doubling per
    /// consecutive failure. Increments the item's failure count.
    pub async fn next_delay(&self, item: &T) -> Duration {
        let mut failures = self.failures.lock().await;
        let count = failures.entry(item.clone()).or_insert(0);
        let delay = backoff_for(self.base, *count).min(self.max);
        *count = count.saturating_add(1);
        delay
    }

    /// Consecutive failure count recorded for `item`.
    pub async fn requeues(&self, item: &T) -> u32 {
        self.failures.lock().await.get(item).copied().unwrap_or(0)
    }

    /// Reset the failure count for `item` (on success or on giving up).
    pub async fn forget(&self, item: &T) {
        self.failures.lock().await.remove(item);
    }
}

/// `base * 2^failures`, saturating at `Duration::MAX` for large counts.
fn backoff_for(base: Duration, failures: u32) -> Duration {
    match 2u32.checked_pow(failures) {
        Some(factor) => base.saturating_mul(factor),
        None => Duration::MAX,
    }
}
