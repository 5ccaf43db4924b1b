//! Bridge between a [`Reconciler`] and the taskvisor runtime.
//!
//! A reconciliation becomes a one-shot task: requeue-worthy outcomes fail the attempt so the supervisor's restart
//! and backoff policy decides when to run it again.

use std::sync::Arc;

use edgenet_model::{Object, ReconcileRequest};
use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    hooks::LifecycleHooks,
    reconciler::{ReconcileOutcome, Reconciler},
    store::ResourceStore,
};

const TASK_NAME: &str = "edgenet-reconcile";

pub fn reconcile_task<K, S, H>(
    reconciler: Arc<Reconciler<K, S, H>>,
    request: ReconcileRequest,
) -> TaskRef
where
    K: Object,
    S: ResourceStore<K>,
    H: LifecycleHooks<K>,
{
    let request = Arc::new(request);

    TaskFn::arc(TASK_NAME, move |ctx: CancellationToken| {
        let reconciler = Arc::clone(&reconciler);
        let request = Arc::clone(&request);

        async move {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            let outcome = reconciler.reconcile(&request, &ctx).await;
            into_task_result(&request, outcome)
        }
    })
}

/// Translate a reconcile outcome into the taskvisor result contract.
pub(crate) fn into_task_result(
    request: &ReconcileRequest,
    outcome: ReconcileOutcome,
) -> Result<(), TaskError> {
    match outcome.error {
        Some(e) if e.is_canceled() => Err(TaskError::Canceled),
        Some(e) if outcome.requeue => {
            debug!(id = %request.id, error = %e, "reconcile incomplete; requeue");
            Err(TaskError::Fail {
                reason: format!("reconcile {}: {e}", request.id),
            })
        }
        Some(e) => {
            warn!(id = %request.id, error = %e, "reconcile failed; waiting for next change");
            Ok(())
        }
        None if outcome.requeue => Err(TaskError::Fail {
            reason: format!("reconcile {}: requeue requested", request.id),
        }),
        None => {
            debug!(id = %request.id, "reconcile done");
            Ok(())
        }
    }
}
