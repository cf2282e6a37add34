//! The idempotent sync algorithm: read, derive, converge.

use std::sync::Arc;

use gale_core::{Ingress, ObjectKey, RouteSpec, Service};
use tracing::{debug, info};

use crate::cache::ObjectStore;
use crate::client::IngressClient;
use crate::error::{Error, Result};

/// Converges one key at a time: reads both caches, derives the desired
/// route from the service's annotations, and issues the minimal mutation.
///
/// Convergence is create-or-delete; an existing ingress is never patched,
/// so parameter changes land via delete-then-recreate across successive
/// syncs.
pub struct SyncEngine {
    services: Arc<dyn ObjectStore<Service>>,
    ingresses: Arc<dyn ObjectStore<Ingress>>,
    client: Arc<dyn IngressClient>,
}

impl SyncEngine {
    /// Create a sync engine over the two caches and the mutation client.
    pub fn new(
        services: Arc<dyn ObjectStore<Service>>,
        ingresses: Arc<dyn ObjectStore<Ingress>>,
        client: Arc<dyn IngressClient>,
    ) -> Self {
        Self {
            services,
            ingresses,
            client,
        }
    }

    /// Drive the state for `key` toward what its service asks for.
    ///
    /// A missing service is a no-op success: the router's delete handler
    /// already performed any cleanup. Cache failures other than not-found
    /// and all client failures propagate to the retry policy.
    pub async fn sync(&self, key: &ObjectKey) -> Result<()> {
        let service = match self.services.get(&key.namespace, &key.name).await {
            Ok(service) => service,
            Err(err) if err.is_not_found() => {
                debug!(%key, "service gone, nothing to sync");
                return Ok(());
            }
            Err(err) => return Err(Error::cache_lookup("service", key, err.to_string())),
        };

        let existing = match self.ingresses.get(&key.namespace, &key.name).await {
            Ok(ingress) => Some(ingress),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(Error::cache_lookup("ingress", key, err.to_string())),
        };

        let route = RouteSpec::from_service(&service);

        match (route.exposed, existing) {
            (true, None) => {
                info!(%key, host = %route.host, port = route.port, "creating ingress");
                let ingress = route.build_ingress(&service);
                self.client
                    .create(&ingress)
                    .await
                    .map_err(|err| Error::mutation("create", key, err.to_string()))?;
            }
            (true, Some(_)) => {
                // Existing ingresses are left alone; parameter drift is
                // not reconciled in place.
                debug!(%key, "ingress already present");
            }
            (false, Some(_)) => {
                info!(%key, "deleting ingress, service opted out");
                self.client
                    .delete(&key.namespace, &key.name)
                    .await
                    .map_err(|err| Error::mutation("delete", key, err.to_string()))?;
            }
            (false, None) => {
                debug!(%key, "nothing to do");
            }
        }

        Ok(())
    }
}
