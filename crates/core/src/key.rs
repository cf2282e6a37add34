//! Logical keys identifying one object per collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not parse as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("key '{key}' is not of the form namespace/name")]
    MissingSeparator { key: String },

    #[error("key '{key}' has an empty namespace or name segment")]
    EmptySegment { key: String },

    #[error("key '{key}' has more than one '/' separator")]
    ExtraSeparator { key: String },
}

/// A `namespace/name` pair identifying one primary object and, by
/// convention, the secondary object derived from it.
///
/// The queue holds at most one pending entry per key; concurrent events
/// for the same key collapse into one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Namespace of the object.
    pub namespace: String,
    /// Name of the object.
    pub name: String,
}

impl ObjectKey {
    /// Create a key from namespace and name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, name)) = s.split_once('/') else {
            return Err(KeyParseError::MissingSeparator { key: s.to_string() });
        };
        if name.contains('/') {
            return Err(KeyParseError::ExtraSeparator { key: s.to_string() });
        }
        if namespace.is_empty() || name.is_empty() {
            return Err(KeyParseError::EmptySegment { key: s.to_string() });
        }
        Ok(Self::new(namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let key = ObjectKey::new("default", "foo");
        assert_eq!(key.to_string(), "default/foo");
        assert_eq!("default/foo".parse::<ObjectKey>().ok(), Some(key));
    }

    #[test]
    fn test_rejects_missing_separator() {
        let err = "foo".parse::<ObjectKey>();
        assert!(matches!(err, Err(KeyParseError::MissingSeparator { .. })));
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(matches!(
            "/foo".parse::<ObjectKey>(),
            Err(KeyParseError::EmptySegment { .. })
        ));
        assert!(matches!(
            "default/".parse::<ObjectKey>(),
            Err(KeyParseError::EmptySegment { .. })
        ));
    }

    #[test]
    fn test_rejects_extra_separator() {
        assert!(matches!(
            "a/b/c".parse::<ObjectKey>(),
            Err(KeyParseError::ExtraSeparator { .. })
        ));
    }
}
