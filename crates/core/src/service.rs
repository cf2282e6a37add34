//! The watched primary object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::annotations;
use crate::key::ObjectKey;

/// Kind recorded on owner references pointing back at a service.
pub const SERVICE_KIND: &str = "Service";

/// A service as observed through the cache.
///
/// Owned by the external store; the engine only reads it. Its annotations
/// are the declarative input that drives ingress creation and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Namespace of the service.
    pub namespace: String,
    /// Name of the service.
    pub name: String,
    /// String-keyed declarative metadata.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl Service {
    /// Create a service with no annotations.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            annotations: HashMap::new(),
        }
    }

    /// Add one annotation (builder style).
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// The logical key for this service.
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Look up one annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Whether the service opts into ingress management.
    pub fn wants_ingress(&self) -> bool {
        self.annotations.contains_key(annotations::HTTP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        let svc = Service::new("default", "foo");
        assert_eq!(svc.key(), ObjectKey::new("default", "foo"));
    }

    #[test]
    fn test_wants_ingress() {
        let svc = Service::new("default", "foo");
        assert!(!svc.wants_ingress());

        let svc = svc.with_annotation(annotations::HTTP, "true");
        assert!(svc.wants_ingress());
    }

    #[test]
    fn test_annotation_lookup() {
        let svc = Service::new("default", "foo").with_annotation(annotations::DOMAIN, "foo.example.com");
        assert_eq!(svc.annotation(annotations::DOMAIN), Some("foo.example.com"));
        assert_eq!(svc.annotation(annotations::PATH), None);
    }
}
