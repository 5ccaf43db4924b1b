use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::SystemTime,
};

use async_trait::async_trait;
use edgenet_model::{NamespacedName, Object, ResourceVersion};
use tracing::trace;

use crate::{error::StoreError, store::ResourceStore};

/// In-memory object store with Kubernetes-style deletion semantics.
///
/// - every write bumps `resource_version`; [`ResourceStore::update`] is version-checked;
/// - [`MemoryStore::delete`] on an object holding finalizers only stamps `deletion_timestamp`;
/// - the object is dropped once it is pending deletion and its finalizer set is empty.
///
/// Clones share the same underlying map.
pub struct MemoryStore<K> {
    inner: Arc<RwLock<HashMap<NamespacedName, K>>>,
}

impl<K> Clone for MemoryStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Object> Default for MemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Object> MemoryStore<K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create or replace an object, bypassing version checks.
    ///
    /// Assigns a uid when missing and bumps the version past any replaced copy.
    pub fn insert(&self, mut obj: K) -> K {
        let id = obj.id();
        let mut inner = self.write();

        let previous = inner.get(&id).map(|o| o.meta().resource_version).unwrap_or(0);
        let meta = obj.meta_mut();
        if meta.uid.is_empty() {
            meta.uid = uuid::Uuid::new_v4().to_string();
        }
        meta.resource_version = previous.saturating_add(1);

        trace!(%id, version = meta.resource_version, "object stored");
        inner.insert(id, obj.clone());
        obj
    }

    /// Request deletion of an object.
    ///
    /// Without finalizers the object is removed at once; otherwise only the deletion timestamp is set (once).
    pub fn delete(&self, id: &NamespacedName) -> Result<(), StoreError> {
        let mut inner = self.write();

        let guarded = inner
            .get(id)
            .map(|o| !o.meta().finalizers.is_empty())
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if !guarded {
            inner.remove(id);
            trace!(%id, "object removed");
            return Ok(());
        }

        let Some(obj) = inner.get_mut(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        let meta = obj.meta_mut();
        if meta.deletion_timestamp.is_none() {
            meta.deletion_timestamp = Some(SystemTime::now());
            meta.resource_version = meta.resource_version.saturating_add(1);
            trace!(%id, finalizers = ?meta.finalizers, "deletion pending on finalizers");
        }
        Ok(())
    }

    pub fn contains(&self, id: &NamespacedName) -> bool {
        self.read().contains_key(id)
    }

    /// Snapshot of a stored object without going through the async seam.
    pub fn peek(&self, id: &NamespacedName) -> Option<K> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All stored objects, ordered by key.
    pub fn list(&self) -> Vec<K> {
        let inner = self.read();
        let mut ids: Vec<&NamespacedName> = inner.keys().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| inner.get(id).cloned())
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<NamespacedName, K>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<NamespacedName, K>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<K: Object> ResourceStore<K> for MemoryStore<K> {
    async fn get(&self, id: &NamespacedName) -> Result<K, StoreError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update(&self, mut obj: K, expected: ResourceVersion) -> Result<K, StoreError> {
        let id = obj.id();
        let mut inner = self.write();

        let current = inner
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let actual = current.meta().resource_version;
        if actual != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual,
            });
        }

        // uid and deletion timestamp are store-owned.
        let uid = current.meta().uid.clone();
        let deletion_timestamp = current.meta().deletion_timestamp;
        let meta = obj.meta_mut();
        meta.uid = uid;
        meta.deletion_timestamp = deletion_timestamp;
        meta.resource_version = actual.saturating_add(1);

        if meta.is_deleting() && meta.finalizers.is_empty() {
            inner.remove(&id);
            trace!(%id, "last finalizer released; object removed");
        } else {
            trace!(%id, version = meta.resource_version, "object updated");
            inner.insert(id, obj.clone());
        }
        Ok(obj)
    }
}
