//! Desired routing state derived from service annotations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::annotations;
use crate::ingress::{Backend, HttpPath, Ingress, IngressRule, IngressSpec, OwnerReference, PathType};
use crate::service::{Service, SERVICE_KIND};

/// Host used when `ingress/domain` is absent.
pub const DEFAULT_HOST: &str = "www.example.com";

/// Path used when `ingress/Path` is absent.
pub const DEFAULT_PATH: &str = "/";

/// Port used when `ingress/Port` is absent or unparseable.
pub const DEFAULT_PORT: u16 = 80;

/// Rewrite target used when `ingress/targetPath` is absent.
pub const DEFAULT_REWRITE_TARGET: &str = "/";

/// The routing state a service's annotations ask for.
///
/// Derived fresh on every sync. `PartialEq` covers exactly the fields the
/// engine acts on, so the router can drop update events that change
/// nothing relevant instead of deep-comparing whole objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Whether an ingress should exist at all (`ingress/http` present).
    pub exposed: bool,
    /// Host the rule serves.
    pub host: String,
    /// Path the rule matches, exactly.
    pub path: String,
    /// Backend port on the service.
    pub port: u16,
    /// Proxy rewrite target.
    pub rewrite_target: String,
}

impl RouteSpec {
    /// Derive the desired route from a service's annotations, substituting
    /// defaults for absent keys.
    ///
    /// The port annotation must parse as a positive integer; anything else
    /// falls back to [`DEFAULT_PORT`].
    pub fn from_service(service: &Service) -> Self {
        let port = service
            .annotation(annotations::PORT)
            .and_then(|raw| raw.parse::<u16>().ok())
            .filter(|port| *port > 0)
            .unwrap_or(DEFAULT_PORT);

        Self {
            exposed: service.wants_ingress(),
            host: service
                .annotation(annotations::DOMAIN)
                .unwrap_or(DEFAULT_HOST)
                .to_string(),
            path: service
                .annotation(annotations::PATH)
                .unwrap_or(DEFAULT_PATH)
                .to_string(),
            port,
            rewrite_target: service
                .annotation(annotations::TARGET_PATH)
                .unwrap_or(DEFAULT_REWRITE_TARGET)
                .to_string(),
        }
    }

    /// Build the ingress this route asks for, owned by `service`.
    ///
    /// Name and namespace match the service; the single rule binds the
    /// desired host and path (exact match) to the service's name and the
    /// desired port; the rewrite target rides along as an annotation.
    pub fn build_ingress(&self, service: &Service) -> Ingress {
        let mut ingress_annotations = HashMap::new();
        ingress_annotations.insert(
            annotations::REWRITE_TARGET.to_string(),
            self.rewrite_target.clone(),
        );

        Ingress {
            namespace: service.namespace.clone(),
            name: service.name.clone(),
            owner: Some(OwnerReference {
                kind: SERVICE_KIND.to_string(),
                name: service.name.clone(),
            }),
            annotations: ingress_annotations,
            spec: IngressSpec {
                class_name: Some(annotations::INGRESS_CLASS.to_string()),
                rules: vec![IngressRule {
                    host: self.host.clone(),
                    paths: vec![HttpPath {
                        path: self.path.clone(),
                        path_type: PathType::Exact,
                        backend: Backend {
                            service: service.name.clone(),
                            port: self.port,
                        },
                    }],
                }],
            },
        }
    }
}
