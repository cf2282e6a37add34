//! The mutation client: the only path through which the engine changes
//! the world.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gale_core::{Ingress, ObjectKey};
use tokio::sync::Mutex;

use crate::cache::MemoryStore;

/// A failed call against the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    /// What went wrong, as reported by the store.
    pub reason: String,
}

impl ClientError {
    /// Create a client error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for ClientError {}

/// Performs create and delete calls against the secondary collection.
///
/// Both calls are treated as idempotent-enough that deleting an
/// already-absent ingress is tolerable; failures are surfaced and retried
/// by the caller.
#[async_trait]
pub trait IngressClient: Send + Sync {
    /// Create an ingress.
    async fn create(&self, ingress: &Ingress) -> Result<(), ClientError>;

    /// Delete the ingress with the given namespace and name.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), ClientError>;
}

/// One recorded mutation, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(ObjectKey),
    Delete(ObjectKey),
}

/// In-memory [`IngressClient`] backed by a [`MemoryStore`].
///
/// Mutations are applied to the shared store, so the cache immediately
/// reflects them - the in-process analogue of the informer feeding
/// changes back. Every call is recorded, and upcoming calls can be made
/// to fail for retry tests.
pub struct MemoryIngressClient {
    store: Arc<MemoryStore<Ingress>>,
    log: Mutex<Vec<Mutation>>,
    failures_remaining: Mutex<u32>,
}

impl MemoryIngressClient {
    /// Create a client applying mutations to `store`.
    pub fn new(store: Arc<MemoryStore<Ingress>>) -> Self {
        Self {
            store,
            log: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(0),
        }
    }

    /// Make the next `count` calls fail with an injected error.
    pub async fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().await = count;
    }

    /// Every mutation performed so far, in order.
    pub async fn mutations(&self) -> Vec<Mutation> {
        self.log.lock().await.clone()
    }

    async fn maybe_fail(&self) -> Result<(), ClientError> {
        let mut remaining = self.failures_remaining.lock().await;
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ClientError::new("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl IngressClient for MemoryIngressClient {
    async fn create(&self, ingress: &Ingress) -> Result<(), ClientError> {
        self.maybe_fail().await?;
        let key = ingress.key();
        self.store.insert(key.clone(), ingress.clone()).await;
        self.log.lock().await.push(Mutation::Create(key));
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), ClientError> {
        self.maybe_fail().await?;
        let key = ObjectKey::new(namespace, name);
        // Deleting an absent ingress is not an error.
        self.store.remove(&key).await;
        self.log.lock().await.push(Mutation::Delete(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gale_core::{RouteSpec, Service};

    fn sample_ingress() -> Ingress {
        let svc = Service::new("default", "foo")
            .with_annotation(gale_core::annotations::HTTP, "true");
        RouteSpec::from_service(&svc).build_ingress(&svc)
    }

    #[tokio::test]
    async fn test_create_lands_in_store_and_log() {
        let store = Arc::new(MemoryStore::new());
        let client = MemoryIngressClient::new(Arc::clone(&store));

        let ingress = sample_ingress();
        assert!(client.create(&ingress).await.is_ok());

        assert!(store.contains(&ingress.key()).await);
        assert_eq!(
            client.mutations().await,
            vec![Mutation::Create(ObjectKey::new("default", "foo"))]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_from_store() {
        let store = Arc::new(MemoryStore::new());
        let client = MemoryIngressClient::new(Arc::clone(&store));

        let ingress = sample_ingress();
        let _ = client.create(&ingress).await;
        assert!(client.delete("default", "foo").await.is_ok());

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_of_absent_ingress_is_ok() {
        let store = Arc::new(MemoryStore::new());
        let client = MemoryIngressClient::new(store);

        assert!(client.delete("default", "missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failures_consumed_in_order() {
        let store = Arc::new(MemoryStore::new());
        let client = MemoryIngressClient::new(Arc::clone(&store));
        client.fail_next(2).await;

        let ingress = sample_ingress();
        assert!(client.create(&ingress).await.is_err());
        assert!(client.create(&ingress).await.is_err());
        assert!(client.create(&ingress).await.is_ok());

        assert_eq!(client.mutations().await.len(), 1);
    }
}
