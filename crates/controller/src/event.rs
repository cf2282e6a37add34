//! Cache notifications as a closed set of typed variants.

use gale_core::{Ingress, ObjectKey, Service};

/// A change notification from one of the watched collections.
///
/// Carrying full snapshots keeps the router free of runtime type checks;
/// only the variants the engine reacts to exist. Adds and updates to
/// ingresses are deliberately not modeled: drift injected directly into
/// ingresses is not reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// A service appeared.
    ServiceAdded(Service),
    /// A service changed, with before and after snapshots.
    ServiceUpdated { old: Service, new: Service },
    /// A service was removed; the snapshot is the last observed state.
    ServiceDeleted(Service),
    /// An ingress was removed; the snapshot is the last observed state.
    IngressDeleted(Ingress),
}

impl ResourceEvent {
    /// The logical key the event concerns.
    pub fn key(&self) -> ObjectKey {
        match self {
            Self::ServiceAdded(svc) | Self::ServiceDeleted(svc) => svc.key(),
            Self::ServiceUpdated { new, .. } => new.key(),
            Self::IngressDeleted(ingress) => ingress.key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_follows_new_snapshot_on_update() {
        let old = Service::new("default", "foo");
        let new = old.clone().with_annotation("x", "y");
        let event = ResourceEvent::ServiceUpdated { old, new };
        assert_eq!(event.key(), ObjectKey::new("default", "foo"));
    }
}
