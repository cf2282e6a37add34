//! Classifies sync outcomes into requeue, drop, or forget.

use gale_core::ObjectKey;
use gale_workqueue::RateLimitedQueue;
use tracing::{error, warn};

use crate::error::Result;

/// Decides the queue's next action after each sync attempt.
///
/// Bounds wasted work under persistent failure: a key is retried with
/// exponential backoff at most `max_retries` times, then dropped and its
/// counter reset. A dropped key comes back only via a future external
/// event.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a policy giving up after `max_retries` consecutive failures.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Record one sync outcome for `key`.
    ///
    /// The caller still owns the in-flight slot and must call
    /// [`RateLimitedQueue::done`] afterwards so dirty redelivery works.
    pub async fn observe(
        &self,
        queue: &RateLimitedQueue<ObjectKey>,
        key: &ObjectKey,
        outcome: &Result<()>,
    ) {
        match outcome {
            Ok(()) => {
                queue.forget(key).await;
            }
            Err(err) => {
                if queue.num_requeues(key).await < self.max_retries {
                    warn!(%key, error = %err, "sync failed, requeueing with backoff");
                    queue.add_rate_limited(key.clone()).await;
                } else {
                    error!(%key, error = %err, retries = self.max_retries, "sync failed too often, giving up");
                    queue.forget(key).await;
                }
            }
        }
    }
}
