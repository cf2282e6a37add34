//! The derived secondary object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::key::ObjectKey;

/// Non-owning back-reference from an ingress to the object that caused
/// its creation. Used to filter delete events, not for lifetime
/// management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    /// Declared kind of the owner.
    pub kind: String,
    /// Name of the owner (same namespace as the ingress).
    pub name: String,
}

/// How a rule path is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    /// The request path must equal the rule path exactly.
    Exact,
    /// The rule path is a prefix of the request path.
    Prefix,
}

/// Backend a matched request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Name of the backend service.
    pub service: String,
    /// Port on the backend service.
    pub port: u16,
}

/// One HTTP path binding within a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPath {
    /// Path to match.
    pub path: String,
    /// Match mode for the path.
    pub path_type: PathType,
    /// Where matched requests go.
    pub backend: Backend,
}

/// One host rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Host the rule serves.
    pub host: String,
    /// HTTP paths under that host.
    pub paths: Vec<HttpPath>,
}

/// Routing specification of an ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressSpec {
    /// Ingress class handling this object.
    pub class_name: Option<String>,
    /// Host rules.
    pub rules: Vec<IngressRule>,
}

/// An ingress routing rule derived from a service's annotations.
///
/// Created and deleted by the controller, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    /// Namespace, matching the owning service.
    pub namespace: String,
    /// Name, matching the owning service.
    pub name: String,
    /// Back-reference to the service that caused creation.
    pub owner: Option<OwnerReference>,
    /// Annotations, including the rewrite target.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Routing specification.
    pub spec: IngressSpec,
}

impl Ingress {
    /// The logical key for this ingress.
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Whether this ingress declares the given kind as its owner.
    pub fn owned_by_kind(&self, kind: &str) -> bool {
        self.owner.as_ref().is_some_and(|o| o.kind == kind)
    }
}
