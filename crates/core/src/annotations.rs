//! Annotation keys the controller reads from services and writes to
//! ingresses.
//!
//! Presence of [`HTTP`] on a service opts it into ingress management; the
//! remaining service keys parameterize the generated routing rule and fall
//! back to the defaults in [`crate::route`] when absent.

/// Opt-in flag: a service carrying this key should have an ingress.
pub const HTTP: &str = "ingress/http";

/// Host the generated rule serves.
pub const DOMAIN: &str = "ingress/domain";

/// HTTP path the generated rule matches (exact match).
pub const PATH: &str = "ingress/Path";

/// Backend service port, as an integer string.
pub const PORT: &str = "ingress/Port";

/// Path the proxy rewrites requests to.
pub const TARGET_PATH: &str = "ingress/targetPath";

/// Rewrite annotation written onto generated ingresses.
pub const REWRITE_TARGET: &str = "nginx.ingress.kubernetes.io/rewrite-target";

/// Ingress class assigned to generated ingresses.
pub const INGRESS_CLASS: &str = "nginx";
