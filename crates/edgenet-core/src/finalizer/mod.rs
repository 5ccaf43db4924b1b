//! Finalizer-guarded access to stored objects.
//!
//! [`FinalizerGuard::acquire`] makes sure the controller's lifecycle marker is attached before any business logic runs,
//! and [`FinalizerGuard::release`] detaches it once cleanup for a deleting object is done.
//! Neither retries on its own: every error means "start over from a fresh fetch".

use edgenet_model::{NamespacedName, Object};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::{
    error::StoreError,
    store::{ResourceStore, cancellable},
};

/// Result of a successful [`FinalizerGuard::acquire`].
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition<K> {
    /// The object no longer exists; nothing to do.
    Absent,
    /// The object is live and carries the marker.
    Active(K),
    /// The object is pending deletion. The marker was not added on this pass.
    Deleting(K),
}

impl<K> Acquisition<K> {
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Acquisition::Absent)
    }

    #[inline]
    pub fn is_pending_deletion(&self) -> bool {
        matches!(self, Acquisition::Deleting(_))
    }

    pub fn object(&self) -> Option<&K> {
        match self {
            Acquisition::Absent => None,
            Acquisition::Active(obj) | Acquisition::Deleting(obj) => Some(obj),
        }
    }

    pub fn into_object(self) -> Option<K> {
        match self {
            Acquisition::Absent => None,
            Acquisition::Active(obj) | Acquisition::Deleting(obj) => Some(obj),
        }
    }
}

pub struct FinalizerGuard<S> {
    store: S,
    finalizer: String,
}

impl<S> FinalizerGuard<S> {
    pub fn new(store: S, finalizer: impl Into<String>) -> Self {
        Self {
            store,
            finalizer: finalizer.into(),
        }
    }

    #[inline]
    pub fn finalizer(&self) -> &str {
        &self.finalizer
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch `id` and attach the marker unless the object is already being deleted.
    ///
    /// A missing object is `Ok(Absent)`, not an error. The marker is written with a conditional update keyed on
    /// the fetched version; a conflict surfaces as an error and nothing is merged. Objects that already carry
    /// the marker are returned without a write.
    ///
    /// # Errors
    /// Any store failure other than `NotFound`, including [`StoreError::Canceled`] when `cancel` fires mid-call.
    /// All of them are retryable.
    #[instrument(level = "debug", skip(self, cancel), fields(finalizer = %self.finalizer))]
    pub async fn acquire<K>(
        &self,
        id: &NamespacedName,
        cancel: &CancellationToken,
    ) -> Result<Acquisition<K>, StoreError>
    where
        K: Object,
        S: ResourceStore<K>,
    {
        // `get` hands out an owned copy; the store's own view is never touched.
        let mut obj = match cancellable(cancel, self.store.get(id)).await {
            Ok(obj) => obj,
            Err(e) if e.is_not_found() => {
                debug!("object not found; nothing to guard");
                return Ok(Acquisition::Absent);
            }
            Err(e) => return Err(e),
        };

        let meta = obj.meta_mut();
        if !meta.is_deleting() && meta.add_finalizer(&self.finalizer) {
            let expected = meta.resource_version;
            obj = cancellable(cancel, self.store.update(obj, expected)).await?;
            debug!(version = obj.meta().resource_version, "finalizer attached");
        } else {
            trace!("finalizer already settled; no write");
        }

        if obj.meta().is_deleting() {
            Ok(Acquisition::Deleting(obj))
        } else {
            Ok(Acquisition::Active(obj))
        }
    }

    /// Detach the marker from an object pending deletion and persist the change.
    ///
    /// Works on a private copy of `obj`. When the marker is already gone no write is issued, so releasing twice
    /// is harmless. A `NotFound` from the store means the object was already finalized and counts as released.
    ///
    /// Callers must only pass objects obtained as [`Acquisition::Deleting`].
    ///
    /// # Errors
    /// The store failure of the conditional update, unchanged. No retry is attempted here.
    #[instrument(level = "debug", skip(self, obj, cancel), fields(id = %obj.id(), finalizer = %self.finalizer))]
    pub async fn release<K>(&self, obj: &K, cancel: &CancellationToken) -> Result<(), StoreError>
    where
        K: Object,
        S: ResourceStore<K>,
    {
        let mut working = obj.clone();
        let meta = working.meta_mut();
        if !meta.remove_finalizer(&self.finalizer) {
            trace!("finalizer already released; no write");
            return Ok(());
        }

        let expected = meta.resource_version;
        match cancellable(cancel, self.store.update(working, expected)).await {
            Ok(_) => {
                debug!("finalizer released");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("object already gone; treating finalizer as released");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
