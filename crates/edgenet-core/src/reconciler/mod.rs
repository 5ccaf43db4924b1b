mod config;
pub use config::{HookErrorPolicy, ReconcilerConfig};

mod outcome;
pub use outcome::ReconcileOutcome;

use std::marker::PhantomData;

use edgenet_model::{Object, ReconcileRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::{
    error::{ConfigError, HookError},
    finalizer::{Acquisition, FinalizerGuard},
    hooks::LifecycleHooks,
    store::ResourceStore,
};

/// Single entry point the scheduler calls per request.
///
/// Each call starts from a fresh fetch and keeps nothing afterwards:
///
/// ```text
/// fetch ──┬── absent ─────────────────────────────► done
///         ├── error ──────────────────────────────► requeue
///         ├── active ── on_update ────────────────► done | hook error
///         └── deleting ── on_deletion ── release ─► done | error
/// ```
///
/// At most one reconciliation per identifier may be in flight; that ordering is the scheduler's job.
pub struct Reconciler<K, S, H> {
    guard: FinalizerGuard<S>,
    hooks: H,
    config: ReconcilerConfig,
    _kind: PhantomData<fn() -> K>,
}

impl<K, S, H> Reconciler<K, S, H>
where
    K: Object,
    S: ResourceStore<K>,
    H: LifecycleHooks<K>,
{
    pub fn new(store: S, hooks: H, config: ReconcilerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            guard: FinalizerGuard::new(store, config.finalizer.clone()),
            hooks,
            config,
            _kind: PhantomData,
        })
    }

    /// Reconciler with [`ReconcilerConfig::default`].
    pub fn with_defaults(store: S, hooks: H) -> Self {
        let config = ReconcilerConfig::default();
        Self {
            guard: FinalizerGuard::new(store, config.finalizer.clone()),
            hooks,
            config,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    #[inline]
    pub fn guard(&self) -> &FinalizerGuard<S> {
        &self.guard
    }

    #[instrument(
        level = "debug",
        skip(self, req, cancel),
        fields(id = %req.id, trigger = req.trigger.as_deref().unwrap_or("-"))
    )]
    pub async fn reconcile(
        &self,
        req: &ReconcileRequest,
        cancel: &CancellationToken,
    ) -> ReconcileOutcome {
        let acquired: Acquisition<K> = match self.guard.acquire(&req.id, cancel).await {
            Ok(acquired) => acquired,
            Err(e) => {
                debug!(error = %e, "acquire failed; requeue");
                return ReconcileOutcome::retry(e);
            }
        };

        match acquired {
            Acquisition::Absent => ReconcileOutcome::done(),
            Acquisition::Active(obj) => match self.hooks.on_update(&obj).await {
                Ok(()) => ReconcileOutcome::done(),
                Err(e) => self.hook_failed("on_update", e),
            },
            Acquisition::Deleting(obj) => self.finalize(&obj, cancel).await,
        }
    }

    async fn finalize(&self, obj: &K, cancel: &CancellationToken) -> ReconcileOutcome {
        if !obj.meta().has_finalizer(self.guard.finalizer()) {
            // Either released on an earlier pass or never attached; cleanup is not ours to run.
            trace!("deleting object carries no marker of ours");
            return ReconcileOutcome::done();
        }

        if let Err(e) = self.hooks.on_deletion(obj).await {
            return self.hook_failed("on_deletion", e);
        }

        match self.guard.release(obj, cancel).await {
            Ok(()) => ReconcileOutcome::done(),
            Err(e) => {
                debug!(error = %e, "release failed; requeue");
                ReconcileOutcome::retry(e)
            }
        }
    }

    fn hook_failed(&self, hook: &'static str, e: HookError) -> ReconcileOutcome {
        let requeue = self.config.hook_error_policy.requeue();
        debug!(hook, error = %e, requeue, "lifecycle hook failed");
        ReconcileOutcome::failed(e, requeue)
    }
}
