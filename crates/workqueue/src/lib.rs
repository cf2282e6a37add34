//! Deduplicating, rate-limited work queue.
//!
//! The queue holds at most one pending entry per item and at most one
//! in-flight delivery per item:
//!
//! - adding an item that is already pending is a no-op
//! - adding an item that is currently being processed marks it dirty, and
//!   it is re-delivered once after [`WorkQueue::done`]
//!
//! [`RateLimitedQueue`] layers a per-item exponential backoff on top, so
//! failed items can be re-queued with increasing delay and a bounded
//! failure counter.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gale_workqueue::RateLimitedQueue;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue: Arc<RateLimitedQueue<String>> = Arc::new(RateLimitedQueue::with_defaults());
//!     queue.add("default/foo".to_string()).await;
//!
//!     while let Some(item) = queue.get().await {
//!         // process item, then:
//!         queue.forget(&item).await;
//!         queue.done(&item).await;
//!     }
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod queue;
pub mod rate_limiter;

pub use queue::{RateLimitedQueue, WorkQueue};
pub use rate_limiter::{RateLimiter, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};
