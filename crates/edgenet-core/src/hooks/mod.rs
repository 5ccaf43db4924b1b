use std::sync::Arc;

use async_trait::async_trait;
use edgenet_model::Object;

use crate::error::HookError;

/// Business-logic extension points driven by the [`crate::Reconciler`].
///
/// Both callbacks run after the finalizer is settled and receive the controller's working copy.
/// Implementations must be safe to call again for the same object; the scheduler may redeliver.
#[async_trait]
pub trait LifecycleHooks<K: Object>: Send + Sync + 'static {
    /// Called for a live object that carries the controller's marker.
    async fn on_update(&self, _obj: &K) -> Result<(), HookError> {
        Ok(())
    }

    /// Called for an object pending deletion, before the marker is released.
    ///
    /// Returning an error keeps the marker in place so the object is not removed.
    async fn on_deletion(&self, _obj: &K) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl<K: Object> LifecycleHooks<K> for NoopHooks {}

#[async_trait]
impl<K, T> LifecycleHooks<K> for Arc<T>
where
    K: Object,
    T: LifecycleHooks<K> + ?Sized,
{
    async fn on_update(&self, obj: &K) -> Result<(), HookError> {
        (**self).on_update(obj).await
    }

    async fn on_deletion(&self, obj: &K) -> Result<(), HookError> {
        (**self).on_deletion(obj).await
    }
}
