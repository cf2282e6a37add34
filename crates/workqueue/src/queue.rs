//! The deduplicating queue and its rate-limited wrapper.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::rate_limiter::RateLimiter;

#[derive(Debug)]
struct Inner<T> {
    /// FIFO of items awaiting delivery. Contains no duplicates.
    pending: VecDeque<T>,
    /// Items that need (re-)processing: everything pending, plus anything
    /// re-added while in flight.
    dirty: HashSet<T>,
    /// Items currently held by a worker.
    processing: HashSet<T>,
    shutting_down: bool,
}

/// Deduplicating FIFO work queue.
///
/// Invariants:
///
/// - at most one pending entry per item
/// - at most one in-flight delivery per item; an item added while in
///   flight is re-delivered exactly once after [`WorkQueue::done`]
///
/// All shared state sits behind one mutex; waiters in [`WorkQueue::get`]
/// arm their wakeup while still holding the lock, so a wake that lands
/// between unlock and suspension is never lost.
#[derive(Debug)]
pub struct WorkQueue<T> {
    inner: Mutex<Inner<T>>,
    wakeup: Notify,
}

impl<T> Default for WorkQueue<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T>
where
    T: Clone + Eq + Hash,
{
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                shutting_down: false,
            }),
            wakeup: Notify::new(),
        }
    }

    /// Insert `item` unless it is already pending.
    ///
    /// If the item is currently being processed it is only marked dirty
    /// and will be re-queued by [`WorkQueue::done`]. Ignored after
    /// shutdown.
    pub async fn add(&self, item: T) {
        let mut inner = self.inner.lock().await;
        if inner.shutting_down {
            return;
        }
        if !inner.dirty.insert(item.clone()) {
            // Already pending or already marked for redelivery.
            return;
        }
        if inner.processing.contains(&item) {
            return;
        }
        inner.pending.push_back(item);
        drop(inner);
        self.wakeup.notify_one();
    }

    /// Wait for the next item.
    ///
    /// Returns `None` once the queue has been shut down and drained. The
    /// returned item is in flight until handed back via
    /// [`WorkQueue::done`].
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.wakeup.notified();
            tokio::pin!(notified);
            {
                let mut inner = self.inner.lock().await;
                if let Some(item) = inner.pending.pop_front() {
                    inner.dirty.remove(&item);
                    inner.processing.insert(item.clone());
                    return Some(item);
                }
                if inner.shutting_down {
                    return None;
                }
                // Arm the wakeup before releasing the lock.
                notified.as_mut().enable();
            }
            notified.await;
        }
    }

    /// Mark `item` no longer in flight; re-queue it if it went dirty
    /// while being processed.
    pub async fn done(&self, item: &T) {
        let mut inner = self.inner.lock().await;
        inner.processing.remove(item);
        if inner.dirty.contains(item) && !inner.shutting_down {
            inner.pending.push_back(item.clone());
            drop(inner);
            self.wakeup.notify_one();
        }
    }

    /// Stop accepting work and wake every blocked [`WorkQueue::get`].
    /// Idempotent.
    pub async fn shut_down(&self) {
        let mut inner = self.inner.lock().await;
        if inner.shutting_down {
            return;
        }
        inner.shutting_down = true;
        drop(inner);
        self.wakeup.notify_waiters();
    }

    /// Number of items awaiting delivery (excludes in-flight items).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.pending.is_empty()
    }

    /// Whether shutdown has been requested.
    pub async fn is_shutting_down(&self) -> bool {
        self.inner.lock().await.shutting_down
    }
}

/// [`WorkQueue`] plus per-item exponential backoff.
///
/// Mirrors the queue's contract and adds
/// [`RateLimitedQueue::add_rate_limited`] for backoff-delayed redelivery
/// of failed items, with the failure counter exposed through
/// [`RateLimitedQueue::num_requeues`].
#[derive(Debug)]
pub struct RateLimitedQueue<T> {
    queue: Arc<WorkQueue<T>>,
    limiter: RateLimiter<T>,
}

impl<T> RateLimitedQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Create a queue whose retry delays start at `base` and cap at `max`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            queue: Arc::new(WorkQueue::new()),
            limiter: RateLimiter::new(base, max),
        }
    }

    /// Create a queue with the default backoff delays.
    pub fn with_defaults() -> Self {
        Self {
            queue: Arc::new(WorkQueue::new()),
            limiter: RateLimiter::with_defaults(),
        }
    }

    /// See [`WorkQueue::add`].
    pub async fn add(&self, item: T) {
        self.queue.add(item).await;
    }

    /// Re-add `item` after a delay derived from its failure count, and
    /// increment that count.
    pub async fn add_rate_limited(&self, item: T) {
        let delay = self.limiter.next_delay(&item).await;
        self.add_after(item, delay).await;
    }

    /// Re-add `item` once `delay` has elapsed. The delivery is dropped if
    /// the queue shuts down first.
    pub async fn add_after(&self, item: T, delay: Duration) {
        let queue = Arc::clone(&self.queue);
        debug!(delay_ms = delay.as_millis() as u64, "scheduling delayed add");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(item).await;
        });
    }

    /// See [`WorkQueue::get`].
    pub async fn get(&self) -> Option<T> {
        self.queue.get().await
    }

    /// See [`WorkQueue::done`].
    pub async fn done(&self, item: &T) {
        self.queue.done(item).await;
    }

    /// Reset the failure count for `item`.
    pub async fn forget(&self, item: &T) {
        self.limiter.forget(item).await;
    }

    /// Consecutive failure count recorded for `item`.
    pub async fn num_requeues(&self, item: &T) -> u32 {
        self.limiter.requeues(item).await
    }

    /// See [`WorkQueue::shut_down`].
    pub async fn shut_down(&self) {
        self.queue.shut_down().await;
    }

    /// See [`WorkQueue::len`].
    pub async fn len(&self) -> usize {
        self.queue.len().await
    }

    /// See [`WorkQueue::is_empty`].
    pub async fn is_empty(&self) -> bool {
        self.queue.is_empty().await
    }

    /// Whether shutdown has been requested.
    pub async fn is_shutting_down(&self) -> bool {
        self.queue.is_shutting_down().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_add_deduplicates_pending_items() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("a").await;
        queue.add("a").await;
        queue.add("b").await;

        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_delivers_in_fifo_order() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("a").await;
        queue.add("b").await;

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, Some("b"));
    }

    #[tokio::test]
    async fn test_add_while_processing_redelivers_once_after_done() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("a").await;

        let item = queue.get().await.unwrap();
        // Several events for the in-flight item collapse into one mark.
        queue.add("a").await;
        queue.add("a").await;
        assert_eq!(queue.len().await, 0);

        queue.done(&item).await;
        assert_eq!(queue.len().await, 1);
        assert_eq!(queue.get().await, Some("a"));

        queue.done(&"a").await;
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn test_at_most_one_in_flight_per_item() {
        let queue = Arc::new(WorkQueue::new());
        queue.add("a").await;

        let first = queue.get().await.unwrap();

        // A second getter must not receive "a" until done is called.
        let contender = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.get().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        queue.add("a").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        queue.done(&first).await;
        let redelivered = contender.await.unwrap();
        assert_eq!(redelivered, Some("a"));
    }

    #[tokio::test]
    async fn test_get_blocks_until_add() {
        let queue: Arc<WorkQueue<&str>> = Arc::new(WorkQueue::new());

        let getter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.get().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!getter.is_finished());

        queue.add("a").await;
        assert_eq!(getter.await.unwrap(), Some("a"));
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_waiters() {
        let queue: Arc<WorkQueue<&str>> = Arc::new(WorkQueue::new());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.get().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.shut_down().await;
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_rejects_new_work() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.shut_down().await;
        queue.shut_down().await;

        queue.add("a").await;
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn test_pending_items_drain_before_shutdown_returns_none() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("a").await;
        queue.shut_down().await;

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_rate_limited_delays_delivery() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::new(
            Duration::from_millis(100),
            Duration::from_secs(1000),
        );

        queue.add_rate_limited("a").await;
        assert_eq!(queue.num_requeues(&"a").await, 1);

        // Nothing lands before the base delay elapses.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.len().await, 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(queue.get().await, Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_delay_grows_per_failure() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::new(
            Duration::from_millis(100),
            Duration::from_secs(1000),
        );

        queue.add_rate_limited("a").await;
        tokio::time::sleep(Duration::from_millis(110)).await;
        let first = queue.get().await.unwrap();
        queue.done(&first).await;

        // Second failure: delay doubles, so 110ms is no longer enough.
        queue.add_rate_limited("a").await;
        tokio::time::sleep(Duration::from_millis(110)).await;
        assert_eq!(queue.len().await, 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.num_requeues(&"a").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_add_dropped_after_shutdown() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::new(
            Duration::from_millis(100),
            Duration::from_secs(1000),
        );

        queue.add_rate_limited("a").await;
        queue.shut_down().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn test_forget_resets_requeue_count() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::with_defaults();

        queue.add_rate_limited("a").await;
        queue.add_rate_limited("a").await;
        assert_eq!(queue.num_requeues(&"a").await, 2);

        queue.forget(&"a").await;
        assert_eq!(queue.num_requeues(&"a").await, 0);
    }
}
