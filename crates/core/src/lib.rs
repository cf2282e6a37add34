//! Core types for the gale controller.
//!
//! This crate holds the data model shared by the work queue and the
//! controller:
//!
//! - **`ObjectKey`**: the `namespace/name` identifier used to deduplicate
//!   and route work
//! - **`Service`**: the watched primary object whose annotations declare
//!   what routing should exist
//! - **`Ingress`**: the derived secondary object the controller creates
//!   and deletes to satisfy those annotations
//! - **`RouteSpec`**: the desired routing state computed from a service's
//!   annotations, with defaults substituted
//!
//! The engine never mutates a service and never patches an ingress in
//! place: convergence is create-or-delete.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod annotations;
pub mod ingress;
pub mod key;
pub mod route;
pub mod service;

pub use ingress::{Backend, HttpPath, Ingress, IngressRule, IngressSpec, OwnerReference, PathType};
pub use key::{KeyParseError, ObjectKey};
pub use route::RouteSpec;
pub use service::Service;
