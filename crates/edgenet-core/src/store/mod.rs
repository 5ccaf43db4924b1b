//! Resource store seam.
//!
//! The controller talks to persistent state only through [`ResourceStore`]: a read by key and a version-checked write.
//! Anything stronger (watches, lists, server-side apply) belongs to the embedding process.

mod memory;
pub use memory::MemoryStore;

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use edgenet_model::{NamespacedName, Object, ResourceVersion};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

#[async_trait]
pub trait ResourceStore<K: Object>: Send + Sync + 'static {
    /// Fetch an owned copy of the object stored under `id`.
    ///
    /// Must report a missing object as [`StoreError::NotFound`], distinct from every other failure.
    async fn get(&self, id: &NamespacedName) -> Result<K, StoreError>;

    /// Persist `obj` only if the stored version still equals `expected`.
    ///
    /// Returns the object as persisted (carrying its new version), or [`StoreError::Conflict`] when the stored copy moved on.
    async fn update(&self, obj: K, expected: ResourceVersion) -> Result<K, StoreError>;
}

#[async_trait]
impl<K, T> ResourceStore<K> for Arc<T>
where
    K: Object,
    T: ResourceStore<K> + ?Sized,
{
    async fn get(&self, id: &NamespacedName) -> Result<K, StoreError> {
        (**self).get(id).await
    }

    async fn update(&self, obj: K, expected: ResourceVersion) -> Result<K, StoreError> {
        (**self).update(obj, expected).await
    }
}

/// Race a store call against the caller's cancellation scope.
///
/// A token that is already cancelled wins before the call is polled.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Canceled),
        res = call => res,
    }
}
