//! Read-only view of the watched collections.
//!
//! The engine never lists or watches itself; an external informer keeps a
//! local mirror and the controller reads it through [`ObjectStore`].
//! [`MemoryStore`] is the in-process implementation used by tests and the
//! demo binary.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use gale_core::ObjectKey;
use tokio::sync::RwLock;

/// Why a cache lookup produced no object.
///
/// Absence is an expected, recognized branch of the sync algorithm and is
/// kept distinguishable from real lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The object is not in the cache.
    NotFound { key: ObjectKey },
    /// The lookup itself failed.
    Failed { reason: String },
}

impl LookupError {
    /// Whether this is the expected-absence case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => write!(f, "object '{key}' not found"),
            Self::Failed { reason } => write!(f, "cache lookup failed: {reason}"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Indexed, eventually-consistent local mirror of one collection.
#[async_trait]
pub trait ObjectStore<T>: Send + Sync {
    /// Point lookup by namespace and name.
    async fn get(&self, namespace: &str, name: &str) -> Result<T, LookupError>;

    /// Whether the initial list has been loaded. The controller waits for
    /// this barrier before starting workers.
    fn has_synced(&self) -> bool;
}

/// In-memory [`ObjectStore`] for tests and the demo binary.
///
/// Starts synced; [`MemoryStore::unsynced`] builds one whose barrier must
/// be released explicitly with [`MemoryStore::mark_synced`].
#[derive(Debug)]
pub struct MemoryStore<T> {
    objects: RwLock<HashMap<ObjectKey, T>>,
    synced: AtomicBool,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStore<T> {
    /// Create an empty store that already reports synced.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            synced: AtomicBool::new(true),
        }
    }

    /// Create an empty store whose sync barrier is still closed.
    pub fn unsynced() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            synced: AtomicBool::new(false),
        }
    }

    /// Release the sync barrier.
    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    /// Insert or replace an object.
    pub async fn insert(&self, key: ObjectKey, object: T) {
        self.objects.write().await.insert(key, object);
    }

    /// Remove an object.
    pub async fn remove(&self, key: &ObjectKey) {
        self.objects.write().await.remove(key);
    }

    /// Whether an object is present.
    pub async fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl<T> ObjectStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<T, LookupError> {
        let key = ObjectKey::new(namespace, name);
        self.objects
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(LookupError::NotFound { key })
    }

    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }
}
