//! Turns cache notifications into queue insertions, filtering noise.

use std::sync::Arc;

use gale_core::service::SERVICE_KIND;
use gale_core::{Ingress, ObjectKey, RouteSpec, Service};
use gale_workqueue::RateLimitedQueue;
use tracing::{debug, error, info};

use crate::cache::ObjectStore;
use crate::client::IngressClient;
use crate::event::ResourceEvent;

/// Routes [`ResourceEvent`]s into the work queue.
///
/// Everything here is best-effort and non-fatal: routing failures are
/// logged and the event dropped, never propagated.
pub struct EventRouter {
    queue: Arc<RateLimitedQueue<ObjectKey>>,
    ingresses: Arc<dyn ObjectStore<Ingress>>,
    client: Arc<dyn IngressClient>,
}

impl EventRouter {
    /// Create a router feeding `queue`.
    pub fn new(
        queue: Arc<RateLimitedQueue<ObjectKey>>,
        ingresses: Arc<dyn ObjectStore<Ingress>>,
        client: Arc<dyn IngressClient>,
    ) -> Self {
        Self {
            queue,
            ingresses,
            client,
        }
    }

    /// Route one event.
    pub async fn route(&self, event: ResourceEvent) {
        match event {
            ResourceEvent::ServiceAdded(service) => {
                // Optimistic: sync decides whether action is needed.
                self.enqueue(service.key()).await;
            }
            ResourceEvent::ServiceUpdated { old, new } => {
                self.route_service_update(&old, &new).await;
            }
            ResourceEvent::ServiceDeleted(service) => {
                self.cleanup_orphaned_ingress(&service).await;
            }
            ResourceEvent::IngressDeleted(ingress) => {
                self.route_ingress_delete(&ingress).await;
            }
        }
    }

    async fn enqueue(&self, key: ObjectKey) {
        debug!(%key, "enqueueing");
        self.queue.add(key).await;
    }

    /// Enqueue only when an annotation the engine acts on changed.
    async fn route_service_update(&self, old: &Service, new: &Service) {
        if RouteSpec::from_service(old) == RouteSpec::from_service(new) {
            debug!(key = %new.key(), "update changes nothing relevant, dropping");
            return;
        }
        self.enqueue(new.key()).await;
    }

    /// Delete the ingress of a removed service directly.
    ///
    /// The one mutation outside the sync cycle: once the service is gone
    /// its key can never be re-synced, so cleanup happens here, through
    /// the same client the engine uses.
    async fn cleanup_orphaned_ingress(&self, service: &Service) {
        if !service.wants_ingress() {
            return;
        }
        let key = service.key();

        match self.ingresses.get(&key.namespace, &key.name).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                debug!(%key, "deleted service left no ingress behind");
                return;
            }
            Err(err) => {
                error!(%key, error = %err, "ingress lookup failed for deleted service");
                return;
            }
        }

        match self.client.delete(&key.namespace, &key.name).await {
            Ok(()) => info!(%key, "deleted ingress for removed service"),
            Err(err) => error!(%key, error = %err, "failed to delete ingress for removed service"),
        }
    }

    /// Re-enqueue a deleted ingress's key so sync can recreate it, but
    /// only if it was one of ours.
    async fn route_ingress_delete(&self, ingress: &Ingress) {
        if !ingress.owned_by_kind(SERVICE_KIND) {
            debug!(key = %ingress.key(), "deleted ingress not service-owned, dropping");
            return;
        }
        self.enqueue(ingress.key()).await;
    }
}
