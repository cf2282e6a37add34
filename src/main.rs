//! Demo entrypoint: the controller wired to in-memory collaborators.
//!
//! Mirrors a real deployment's bootstrap order - caches, client,
//! controller, run - but feeds a scripted scenario instead of a live
//! watch stream: a service opts in, changes its path, then opts out.
//! Runs until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gale_controller::{
    Controller, ControllerConfig, IngressClient, MemoryIngressClient, MemoryStore, ObjectStore,
    ResourceEvent,
};
use gale_core::{annotations, Ingress, KeyParseError, ObjectKey, Service};
use tokio::sync::{mpsc, watch};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gale", about = "Annotation-driven ingress reconciliation controller")]
struct Args {
    /// Number of worker loops draining the queue.
    #[arg(long, default_value_t = gale_controller::DEFAULT_WORKERS)]
    workers: usize,

    /// Consecutive failures per key before giving up.
    #[arg(long, default_value_t = gale_controller::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Service the scripted scenario drives, as `namespace/name`.
    #[arg(long, default_value = "default/web", value_parser = parse_object_key)]
    service: ObjectKey,
}

fn parse_object_key(s: &str) -> Result<ObjectKey, KeyParseError> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let services: Arc<MemoryStore<Service>> = Arc::new(MemoryStore::new());
    let ingresses: Arc<MemoryStore<Ingress>> = Arc::new(MemoryStore::new());
    let client = Arc::new(MemoryIngressClient::new(Arc::clone(&ingresses)));

    let controller = Controller::new(
        Arc::clone(&services) as Arc<dyn ObjectStore<Service>>,
        Arc::clone(&ingresses) as Arc<dyn ObjectStore<Ingress>>,
        client as Arc<dyn IngressClient>,
        ControllerConfig::default()
            .with_workers(args.workers)
            .with_max_retries(args.max_retries),
    );

    let (events_tx, events_rx) = mpsc::channel(64);
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, stopping");
            let _ = stop_tx.send(true);
        }
    });

    tokio::spawn(run_scenario(
        Arc::clone(&services),
        Arc::clone(&ingresses),
        events_tx,
        args.service.clone(),
    ));

    info!(workers = args.workers, "starting controller");
    controller.run(events_rx, stop_rx).await;
    Ok(())
}

/// Scripted stand-in for a live watch stream.
async fn run_scenario(
    services: Arc<MemoryStore<Service>>,
    ingresses: Arc<MemoryStore<Ingress>>,
    events: mpsc::Sender<ResourceEvent>,
    key: ObjectKey,
) {
    let svc = Service::new(key.namespace.clone(), key.name.clone())
        .with_annotation(annotations::HTTP, "true")
        .with_annotation(annotations::DOMAIN, format!("{}.example.com", key.name))
        .with_annotation(annotations::PORT, "8080");
    services.insert(svc.key(), svc.clone()).await;
    let _ = events.send(ResourceEvent::ServiceAdded(svc.clone())).await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    if let Ok(ingress) = ingresses.get(&key.namespace, &key.name).await {
        info!(
            "converged ingress:\n{}",
            serde_json::to_string_pretty(&ingress).unwrap_or_default()
        );
    }

    let updated = svc.clone().with_annotation(annotations::PATH, "/api");
    services.insert(updated.key(), updated.clone()).await;
    let _ = events
        .send(ResourceEvent::ServiceUpdated {
            old: svc,
            new: updated.clone(),
        })
        .await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    let mut opted_out = updated.clone();
    opted_out.annotations.remove(annotations::HTTP);
    services.insert(opted_out.key(), opted_out.clone()).await;
    let _ = events
        .send(ResourceEvent::ServiceUpdated {
            old: updated,
            new: opted_out,
        })
        .await;
}
