//! Wiring: event ingestion, the worker pool, and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use gale_core::{Ingress, ObjectKey, Service};
use gale_workqueue::RateLimitedQueue;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ObjectStore;
use crate::client::IngressClient;
use crate::config::ControllerConfig;
use crate::event::ResourceEvent;
use crate::retry::RetryPolicy;
use crate::router::EventRouter;
use crate::sync::SyncEngine;

/// Poll interval for the initial cache-sync barrier.
const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The level-triggered reconciliation controller.
///
/// One ingestion path feeds the deduplicating queue; a fixed pool of
/// worker loops drains it, each processing one key to completion. No two
/// workers ever hold the same key, and a failure never halts the pool.
pub struct Controller {
    queue: Arc<RateLimitedQueue<ObjectKey>>,
    router: Arc<EventRouter>,
    engine: Arc<SyncEngine>,
    services: Arc<dyn ObjectStore<Service>>,
    ingresses: Arc<dyn ObjectStore<Ingress>>,
    retry: RetryPolicy,
    config: ControllerConfig,
}

impl Controller {
    /// Wire a controller over the two caches and the mutation client.
    pub fn new(
        services: Arc<dyn ObjectStore<Service>>,
        ingresses: Arc<dyn ObjectStore<Ingress>>,
        client: Arc<dyn IngressClient>,
        config: ControllerConfig,
    ) -> Self {
        let queue = Arc::new(RateLimitedQueue::new(
            config.backoff_base,
            config.backoff_max,
        ));
        let router = Arc::new(EventRouter::new(
            Arc::clone(&queue),
            Arc::clone(&ingresses),
            Arc::clone(&client),
        ));
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&services),
            Arc::clone(&ingresses),
            client,
        ));
        let retry = RetryPolicy::new(config.max_retries);

        Self {
            queue,
            router,
            engine,
            services,
            ingresses,
            retry,
            config,
        }
    }

    /// The work queue, exposed for tests and introspection.
    pub fn queue(&self) -> Arc<RateLimitedQueue<ObjectKey>> {
        Arc::clone(&self.queue)
    }

    /// The configuration this controller runs with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run until `stop` fires (set to `true` or sender dropped).
    ///
    /// Waits for both caches to report their initial list loaded, then
    /// starts the ingestion task and the worker pool. On stop, the
    /// ingestion task finishes any route in flight, the queue is shut
    /// down, in-flight syncs complete, and every loop is joined before
    /// returning.
    pub async fn run(
        &self,
        events: mpsc::Receiver<ResourceEvent>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("waiting for caches to sync");
        self.wait_for_cache_sync(&mut stop).await;

        info!(workers = self.config.workers, "starting workers");
        let ingest = self.spawn_ingestion(events, stop.clone());
        let workers: Vec<JoinHandle<()>> = (0..self.config.workers)
            .map(|id| self.spawn_worker(id))
            .collect();

        // Block until the external stop signal fires.
        loop {
            if *stop.borrow_and_update() {
                break;
            }
            if stop.changed().await.is_err() {
                break;
            }
        }

        info!("shutting down workers");
        // A route in flight may still mutate through the client; let the
        // ingestion task finish it before the queue stops taking keys.
        let _ = ingest.await;
        self.queue.shut_down().await;
        let _ = futures::future::join_all(workers).await;
        info!("controller stopped");
    }

    async fn wait_for_cache_sync(&self, stop: &mut watch::Receiver<bool>) {
        while !(self.services.has_synced() && self.ingresses.has_synced()) {
            if *stop.borrow_and_update() {
                return;
            }
            tokio::time::sleep(SYNC_POLL_INTERVAL).await;
        }
    }

    /// Drain events into the router until the channel closes or `stop`
    /// fires. A route already underway always runs to completion.
    fn spawn_ingestion(
        &self,
        mut events: mpsc::Receiver<ResourceEvent>,
        mut stop: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            loop {
                if *stop.borrow_and_update() {
                    break;
                }
                tokio::select! {
                    changed = stop.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            debug!("event channel closed");
                            break;
                        };
                        router.route(event).await;
                    }
                }
            }
        })
    }

    fn spawn_worker(&self, id: usize) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let engine = Arc::clone(&self.engine);
        let retry = self.retry;
        tokio::spawn(async move {
            while let Some(key) = queue.get().await {
                debug!(worker = id, %key, "processing");
                let outcome = engine.sync(&key).await;
                retry.observe(&queue, &key, &outcome).await;
                queue.done(&key).await;
            }
            debug!(worker = id, "worker exiting");
        })
    }
}
