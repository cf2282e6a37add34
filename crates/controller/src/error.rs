//! Error types for the controller crate.

use std::fmt;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types.
///
/// Every failure is local to one key's processing; errors feed the retry
/// policy and never halt the worker pool.
#[derive(Debug, Clone)]
pub enum Error {
    /// A cache lookup failed for a reason other than absence.
    CacheLookup {
        kind: &'static str,
        key: String,
        reason: String,
    },
    /// A create or delete against the authoritative store failed.
    Mutation {
        op: &'static str,
        key: String,
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheLookup { kind, key, reason } => {
                write!(f, "{kind} cache lookup for '{key}' failed: {reason}")
            }
            Self::Mutation { op, key, reason } => {
                write!(f, "{op} of ingress '{key}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a cache lookup error.
    pub fn cache_lookup(
        kind: &'static str,
        key: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::CacheLookup {
            kind,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a mutation error.
    pub fn mutation(op: &'static str, key: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::Mutation {
            op,
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
