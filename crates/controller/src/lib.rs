//! Level-triggered reconciliation engine for gale.
//!
//! The controller watches a primary collection (services), derives a
//! desired secondary object (an ingress routing rule) from each service's
//! annotations, and continuously drives the secondary collection toward
//! that desired state:
//!
//! 1. Cache change -> [`EventRouter`] emits a logical key
//! 2. The deduplicating queue stores or merges it
//! 3. A free worker dequeues it
//! 4. [`SyncEngine`] reads the caches, computes desired state, and issues
//!    the minimal create or delete
//! 5. [`RetryPolicy`] decides requeue-with-backoff vs. drop on failure
//!
//! The watch/cache subsystem and the mutation client are external
//! collaborators behind the [`ObjectStore`] and [`IngressClient`] traits;
//! [`MemoryStore`] and [`MemoryIngressClient`] are the in-process
//! implementations used in tests and demos.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gale_controller::{
//!     Controller, ControllerConfig, MemoryIngressClient, MemoryStore, ResourceEvent,
//! };
//! use tokio::sync::{mpsc, watch};
//!
//! #[tokio::main]
//! async fn main() {
//!     let services = Arc::new(MemoryStore::new());
//!     let ingresses = Arc::new(MemoryStore::new());
//!     let client = Arc::new(MemoryIngressClient::new(ingresses.clone()));
//!
//!     let controller = Controller::new(
//!         services,
//!         ingresses,
//!         client,
//!         ControllerConfig::default(),
//!     );
//!
//!     let (events_tx, events_rx) = mpsc::channel::<ResourceEvent>(64);
//!     let (stop_tx, stop_rx) = watch::channel(false);
//!
//!     // Feed events_tx from the informer; flip stop_tx to shut down.
//!     controller.run(events_rx, stop_rx).await;
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod retry;
pub mod router;
pub mod sync;

pub use cache::{LookupError, MemoryStore, ObjectStore};
pub use client::{ClientError, IngressClient, MemoryIngressClient, Mutation};
pub use config::{ControllerConfig, DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};
pub use controller::Controller;
pub use error::{Error, Result};
pub use event::ResourceEvent;
pub use retry::RetryPolicy;
pub use router::EventRouter;
pub use sync::SyncEngine;
