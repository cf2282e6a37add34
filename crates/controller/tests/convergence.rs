//! End-to-end convergence scenarios running the full controller:
//! ingestion, queue, worker pool, sync, and retry.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use gale_controller::{
    Controller, ControllerConfig, IngressClient, MemoryIngressClient, MemoryStore, Mutation,
    ObjectStore, ResourceEvent,
};
use gale_core::{annotations, Ingress, PathType, Service};
use tokio::sync::{mpsc, watch};

struct Harness {
    services: Arc<MemoryStore<Service>>,
    ingresses: Arc<MemoryStore<Ingress>>,
    client: Arc<MemoryIngressClient>,
    events: mpsc::Sender<ResourceEvent>,
    stop: watch::Sender<bool>,
    run: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn start(config: ControllerConfig) -> Self {
        let services = Arc::new(MemoryStore::new());
        let ingresses = Arc::new(MemoryStore::new());
        let client = Arc::new(MemoryIngressClient::new(Arc::clone(&ingresses)));
        let controller = Arc::new(Controller::new(
            Arc::clone(&services) as Arc<dyn ObjectStore<Service>>,
            Arc::clone(&ingresses) as Arc<dyn ObjectStore<Ingress>>,
            Arc::clone(&client) as Arc<dyn IngressClient>,
            config,
        ));

        let (events_tx, events_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = watch::channel(false);
        let run = tokio::spawn(async move { controller.run(events_rx, stop_rx).await });

        Self {
            services,
            ingresses,
            client,
            events: events_tx,
            stop: stop_tx,
            run,
        }
    }

    /// Put a service into the cache and deliver an added event.
    async fn add_service(&self, service: &Service) {
        self.services.insert(service.key(), service.clone()).await;
        self.events
            .send(ResourceEvent::ServiceAdded(service.clone()))
            .await
            .unwrap();
    }

    /// Replace a service in the cache and deliver an updated event.
    async fn update_service(&self, old: Service, new: &Service) {
        self.services.insert(new.key(), new.clone()).await;
        self.events
            .send(ResourceEvent::ServiceUpdated {
                old,
                new: new.clone(),
            })
            .await
            .unwrap();
    }

    async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.run.await;
    }
}

/// Let the workers drain everything outstanding (paused-time clock).
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test(start_paused = true)]
async fn creates_ingress_from_annotated_service() {
    let h = Harness::start(ControllerConfig::default().with_workers(3));

    let svc = Service::new("default", "foo")
        .with_annotation(annotations::HTTP, "true")
        .with_annotation(annotations::DOMAIN, "foo.example.com")
        .with_annotation(annotations::PATH, "/api")
        .with_annotation(annotations::PORT, "8080");
    h.add_service(&svc).await;
    settle().await;

    assert_eq!(h.client.mutations().await, vec![Mutation::Create(svc.key())]);

    let ingress = h.ingresses.get("default", "foo").await.unwrap();
    assert_eq!(ingress.namespace, "default");
    assert_eq!(ingress.name, "foo");
    let owner = ingress.owner.as_ref().unwrap();
    assert_eq!(owner.kind, "Service");
    assert_eq!(owner.name, "foo");

    let rule = &ingress.spec.rules[0];
    assert_eq!(rule.host, "foo.example.com");
    assert_eq!(rule.paths[0].path, "/api");
    assert_eq!(rule.paths[0].path_type, PathType::Exact);
    assert_eq!(rule.paths[0].backend.service, "foo");
    assert_eq!(rule.paths[0].backend.port, 8080);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn bare_opt_in_gets_defaults() {
    let h = Harness::start(ControllerConfig::default().with_workers(1));

    let svc = Service::new("default", "bare").with_annotation(annotations::HTTP, "true");
    h.add_service(&svc).await;
    settle().await;

    let ingress = h.ingresses.get("default", "bare").await.unwrap();
    let rule = &ingress.spec.rules[0];
    assert_eq!(rule.host, "www.example.com");
    assert_eq!(rule.paths[0].path, "/");
    assert_eq!(rule.paths[0].backend.port, 80);
    assert_eq!(
        ingress.annotations.get(annotations::REWRITE_TARGET).map(String::as_str),
        Some("/")
    );

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn redelivered_events_converge_without_extra_mutations() {
    let h = Harness::start(ControllerConfig::default().with_workers(2));

    let svc = Service::new("default", "foo").with_annotation(annotations::HTTP, "true");
    h.add_service(&svc).await;
    settle().await;

    // A redundant event for an already-converged key is a no-op.
    h.events
        .send(ResourceEvent::ServiceAdded(svc.clone()))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.client.mutations().await.len(), 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn opt_out_deletes_existing_ingress() {
    let h = Harness::start(ControllerConfig::default().with_workers(2));

    let svc = Service::new("default", "foo").with_annotation(annotations::HTTP, "true");
    h.add_service(&svc).await;
    settle().await;
    assert!(h.ingresses.contains(&svc.key()).await);

    let opted_out = Service::new("default", "foo");
    h.update_service(svc, &opted_out).await;
    settle().await;

    assert!(!h.ingresses.contains(&opted_out.key()).await);
    let mutations = h.client.mutations().await;
    assert_eq!(mutations.len(), 2);
    assert_eq!(mutations[1], Mutation::Delete(opted_out.key()));

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_is_retried_then_dropped() {
    let h = Harness::start(
        ControllerConfig::default()
            .with_workers(1)
            .with_max_retries(2)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(50)),
    );

    let svc = Service::new("default", "doomed").with_annotation(annotations::HTTP, "true");
    // Every create fails: initial attempt plus max_retries redeliveries.
    h.client.fail_next(u32::MAX).await;
    h.add_service(&svc).await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    // The key was dropped and its counter reset; nothing ever landed.
    assert!(!h.ingresses.contains(&svc.key()).await);
    assert!(h.client.mutations().await.is_empty());

    // A fresh external event re-triggers the key and now succeeds.
    h.client.fail_next(0).await;
    h.events
        .send(ResourceEvent::ServiceAdded(svc.clone()))
        .await
        .unwrap();
    settle().await;
    assert!(h.ingresses.contains(&svc.key()).await);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn deleted_owned_ingress_is_recreated() {
    let h = Harness::start(ControllerConfig::default().with_workers(2));

    let svc = Service::new("default", "foo").with_annotation(annotations::HTTP, "true");
    h.add_service(&svc).await;
    settle().await;

    // Someone deletes the ingress out from under us.
    let ingress = h.ingresses.get("default", "foo").await.unwrap();
    h.ingresses.remove(&ingress.key()).await;
    h.events
        .send(ResourceEvent::IngressDeleted(ingress))
        .await
        .unwrap();
    settle().await;

    assert!(h.ingresses.contains(&svc.key()).await);
    assert_eq!(h.client.mutations().await.len(), 2);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn service_removal_cleans_up_directly() {
    let h = Harness::start(ControllerConfig::default().with_workers(2));

    let svc = Service::new("default", "foo").with_annotation(annotations::HTTP, "true");
    h.add_service(&svc).await;
    settle().await;

    h.services.remove(&svc.key()).await;
    h.events
        .send(ResourceEvent::ServiceDeleted(svc.clone()))
        .await
        .unwrap();
    settle().await;

    assert!(!h.ingresses.contains(&svc.key()).await);
    let mutations = h.client.mutations().await;
    assert_eq!(mutations[1], Mutation::Delete(svc.key()));

    h.shutdown().await;
}
