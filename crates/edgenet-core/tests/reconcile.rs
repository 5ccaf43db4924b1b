use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use edgenet_core::{
    FinalizerGuard, HookError, LifecycleHooks, MemoryStore, NoopHooks, ReconcileError,
    ReconcileOutcome, Reconciler, ResourceStore, StoreError, reconcile_task,
};
use edgenet_model::{
    CONTROLLER_FINALIZER, ManagedResource, NamespacedName, Object, ReconcileRequest,
    ResourceVersion,
};
use edgenet_observe::{LoggerConfig, logger_init};
use serde_json::json;
use taskvisor::{Task, TaskError};
use tokio_util::sync::CancellationToken;

/// Memory store that counts calls and can misbehave on demand.
#[derive(Default)]
struct ScriptedStore {
    inner: MemoryStore<ManagedResource>,
    gets: AtomicUsize,
    updates: AtomicUsize,
    /// Simulate a concurrent writer touching the object right after each fetch.
    interfere_after_get: AtomicBool,
    fail_get: Mutex<Option<StoreError>>,
    get_delay: Mutex<Option<Duration>>,
    fail_update: Mutex<Option<StoreError>>,
    /// Never answer `update`; only the caller's cancellation ends the call.
    stall_update: AtomicBool,
}

impl ScriptedStore {
    fn with(objects: impl IntoIterator<Item = ManagedResource>) -> Arc<Self> {
        let store = Self::default();
        for obj in objects {
            store.inner.insert(obj);
        }
        Arc::new(store)
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn finalizers(&self, id: &NamespacedName) -> Option<Vec<String>> {
        self.inner.peek(id).map(|o| o.metadata.finalizers)
    }
}

#[async_trait]
impl ResourceStore<ManagedResource> for ScriptedStore {
    async fn get(&self, id: &NamespacedName) -> Result<ManagedResource, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.fail_get.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }

        let obj = self.inner.get(id).await?;
        if self.interfere_after_get.load(Ordering::SeqCst) {
            self.inner.insert(obj.clone());
        }
        Ok(obj)
    }

    async fn update(
        &self,
        obj: ManagedResource,
        expected: ResourceVersion,
    ) -> Result<ManagedResource, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);

        if self.stall_update.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let failure = self.fail_update.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        self.inner.update(obj, expected).await
    }
}

#[derive(Default)]
struct DeletionProbe {
    deletions: AtomicUsize,
}

#[async_trait]
impl LifecycleHooks<ManagedResource> for DeletionProbe {
    async fn on_deletion(&self, _obj: &ManagedResource) -> Result<(), HookError> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn init_logging() {
    let cfg = LoggerConfig {
        level: "debug".to_string(),
        ..Default::default()
    };
    // every test binary shares one global subscriber
    let _ = logger_init(&cfg);
}

fn ns_a() -> NamespacedName {
    "ns/a".parse().unwrap()
}

fn reconciler<H: LifecycleHooks<ManagedResource>>(
    store: &Arc<ScriptedStore>,
    hooks: H,
) -> Reconciler<ManagedResource, Arc<ScriptedStore>, H> {
    Reconciler::with_defaults(Arc::clone(store), hooks)
}

async fn reconcile<H: LifecycleHooks<ManagedResource>>(
    reconciler: &Reconciler<ManagedResource, Arc<ScriptedStore>, H>,
    id: NamespacedName,
) -> ReconcileOutcome {
    reconciler
        .reconcile(&ReconcileRequest::new(id).with_trigger("watch"), &CancellationToken::new())
        .await
}

#[tokio::test]
async fn fresh_resource_gets_marker() {
    init_logging();
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    let reconciler = reconciler(&store, NoopHooks);

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert_eq!(outcome, ReconcileOutcome { requeue: false, error: None });
    assert_eq!(
        store.finalizers(&ns_a()),
        Some(vec!["edge-net.io/controller".to_string()])
    );
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn deleting_resource_runs_cleanup_and_releases_marker() {
    init_logging();
    let store = ScriptedStore::with([
        ManagedResource::new(&ns_a()).with_finalizers([CONTROLLER_FINALIZER])
    ]);
    store.inner.delete(&ns_a()).unwrap();
    let hooks = Arc::new(DeletionProbe::default());
    let reconciler = reconciler(&store, Arc::clone(&hooks));

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert_eq!(outcome, ReconcileOutcome { requeue: false, error: None });
    assert_eq!(hooks.deletions.load(Ordering::SeqCst), 1);
    // with the last marker gone the store finished the deletion
    assert!(!store.inner.contains(&ns_a()));
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn missing_resource_is_a_no_op() {
    init_logging();
    let store = Arc::new(ScriptedStore::default());
    let reconciler = reconciler(&store, NoopHooks);

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert_eq!(outcome, ReconcileOutcome { requeue: false, error: None });
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    assert_eq!(store.updates(), 0);
}

#[tokio::test]
async fn conflict_during_acquisition_requeues() {
    init_logging();
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    store.interfere_after_get.store(true, Ordering::SeqCst);
    let reconciler = reconciler(&store, NoopHooks);

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert!(outcome.requeue);
    assert!(matches!(
        outcome.error,
        Some(ReconcileError::Store(StoreError::Conflict { expected: 1, actual: 2, .. }))
    ));
    // nothing merged: the concurrent writer's copy stands
    assert_eq!(store.finalizers(&ns_a()), Some(vec![]));

    // the next invocation starts from a fresh fetch and succeeds
    store.interfere_after_get.store(false, Ordering::SeqCst);
    assert!(reconcile(&reconciler, ns_a()).await.is_success());
    assert_eq!(
        store.finalizers(&ns_a()),
        Some(vec![CONTROLLER_FINALIZER.to_string()])
    );
}

#[tokio::test]
async fn acquire_conflict_returns_error_without_resource() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    store.interfere_after_get.store(true, Ordering::SeqCst);
    let guard = FinalizerGuard::new(Arc::clone(&store), CONTROLLER_FINALIZER);

    let err = guard
        .acquire::<ManagedResource>(&ns_a(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn acquire_writes_at_most_once_per_resource() {
    let fixtures = [
        ManagedResource::new(&NamespacedName::new("ns", "plain")),
        ManagedResource::new(&NamespacedName::new("ns", "foreign"))
            .with_finalizers(["other.io/cleanup"]),
        ManagedResource::new(&NamespacedName::cluster("cluster-wide"))
            .with_spec(json!({"fullName": "Edge Lab"})),
    ];
    let store = ScriptedStore::with(fixtures.clone());
    let guard = FinalizerGuard::new(Arc::clone(&store), CONTROLLER_FINALIZER);
    let cancel = CancellationToken::new();

    for obj in &fixtures {
        let before = store.updates();
        guard
            .acquire::<ManagedResource>(&obj.id(), &cancel)
            .await
            .unwrap();
        assert_eq!(store.updates(), before + 1, "{} should be written once", obj.id());

        let markers = store.finalizers(&obj.id()).unwrap();
        let ours = markers.iter().filter(|f| *f == CONTROLLER_FINALIZER).count();
        assert_eq!(ours, 1);
    }

    // second pass: fast path only
    let before = store.updates();
    for obj in &fixtures {
        guard
            .acquire::<ManagedResource>(&obj.id(), &cancel)
            .await
            .unwrap();
    }
    assert_eq!(store.updates(), before);
}

#[tokio::test]
async fn acquire_never_marks_deleting_resources() {
    let with_marker = NamespacedName::new("ns", "with-marker");
    let without_marker = NamespacedName::new("ns", "without-marker");
    let store = ScriptedStore::with([
        ManagedResource::new(&with_marker).with_finalizers([CONTROLLER_FINALIZER]),
        ManagedResource::new(&without_marker).with_finalizers(["other.io/cleanup"]),
    ]);
    store.inner.delete(&with_marker).unwrap();
    store.inner.delete(&without_marker).unwrap();
    let guard = FinalizerGuard::new(Arc::clone(&store), CONTROLLER_FINALIZER);

    for id in [&with_marker, &without_marker] {
        let acquired = guard
            .acquire::<ManagedResource>(id, &CancellationToken::new())
            .await
            .unwrap();
        assert!(acquired.is_pending_deletion());
    }

    assert_eq!(store.updates(), 0);
    assert_eq!(
        store.finalizers(&without_marker),
        Some(vec!["other.io/cleanup".to_string()])
    );
}

#[tokio::test]
async fn transient_fetch_failure_requeues() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    *store.fail_get.lock().unwrap() = Some(StoreError::Unavailable("connection reset".into()));
    let reconciler = reconciler(&store, NoopHooks);

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert_eq!(
        outcome,
        ReconcileOutcome::retry(StoreError::Unavailable("connection reset".into()))
    );
    assert_eq!(store.updates(), 0);
}

#[tokio::test]
async fn cancellation_mid_fetch_requeues() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    *store.get_delay.lock().unwrap() = Some(Duration::from_secs(30));
    let reconciler = reconciler(&store, NoopHooks);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
    };
    let outcome = reconciler
        .reconcile(&ReconcileRequest::new(ns_a()), &cancel)
        .await;
    canceller.await.unwrap();

    assert!(outcome.requeue);
    assert_eq!(outcome.error, Some(ReconcileError::Store(StoreError::Canceled)));
    assert_eq!(store.updates(), 0);
}

#[tokio::test]
async fn full_lifecycle() {
    init_logging();
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    let hooks = Arc::new(DeletionProbe::default());
    let reconciler = reconciler(&store, Arc::clone(&hooks));

    // created: marker attached
    assert!(reconcile(&reconciler, ns_a()).await.is_success());
    // deletion requested: the store only stamps the timestamp
    store.inner.delete(&ns_a()).unwrap();
    assert!(store.inner.contains(&ns_a()));
    // cleanup runs and the marker is released
    assert!(reconcile(&reconciler, ns_a()).await.is_success());
    assert!(!store.inner.contains(&ns_a()));
    // a late redelivery finds nothing
    assert!(reconcile(&reconciler, ns_a()).await.is_success());

    assert_eq!(hooks.deletions.load(Ordering::SeqCst), 1);
    assert_eq!(store.updates(), 2);
}

#[tokio::test]
async fn release_failure_requeues_and_keeps_marker() {
    init_logging();
    let store = ScriptedStore::with([
        ManagedResource::new(&ns_a()).with_finalizers([CONTROLLER_FINALIZER])
    ]);
    store.inner.delete(&ns_a()).unwrap();
    *store.fail_update.lock().unwrap() = Some(StoreError::Unavailable("apiserver down".into()));
    let hooks = Arc::new(DeletionProbe::default());
    let reconciler = reconciler(&store, Arc::clone(&hooks));

    let outcome = reconcile(&reconciler, ns_a()).await;

    assert_eq!(
        outcome,
        ReconcileOutcome {
            requeue: true,
            error: Some(ReconcileError::Store(StoreError::Unavailable("apiserver down".into()))),
        }
    );
    assert_eq!(hooks.deletions.load(Ordering::SeqCst), 1);
    assert!(store.inner.contains(&ns_a()));
    assert_eq!(
        store.finalizers(&ns_a()),
        Some(vec![CONTROLLER_FINALIZER.to_string()])
    );
}

#[tokio::test]
async fn cancellation_mid_persist_requeues() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    store.stall_update.store(true, Ordering::SeqCst);
    let reconciler = reconciler(&store, NoopHooks);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
    };
    let outcome = reconciler
        .reconcile(&ReconcileRequest::new(ns_a()), &cancel)
        .await;
    canceller.await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::retry(StoreError::Canceled));
    // the write was attempted but never landed
    assert_eq!(store.updates(), 1);
    assert_eq!(store.finalizers(&ns_a()), Some(vec![]));
}

#[tokio::test]
async fn reconcile_task_runs_to_completion() {
    init_logging();
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    let reconciler = Arc::new(reconciler(&store, NoopHooks));

    let task = reconcile_task(Arc::clone(&reconciler), ReconcileRequest::new(ns_a()));
    assert_eq!(task.name(), "edgenet-reconcile");

    assert!(task.spawn(CancellationToken::new()).await.is_ok());
    assert_eq!(
        store.finalizers(&ns_a()),
        Some(vec![CONTROLLER_FINALIZER.to_string()])
    );

    // the same task can be restarted by the supervisor; the second run is a no-op
    assert!(task.spawn(CancellationToken::new()).await.is_ok());
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn reconcile_task_fails_attempt_on_requeue() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    *store.fail_get.lock().unwrap() = Some(StoreError::Unavailable("connection reset".into()));
    let task = reconcile_task(Arc::new(reconciler(&store, NoopHooks)), ReconcileRequest::new(ns_a()));

    match task.spawn(CancellationToken::new()).await {
        Err(TaskError::Fail { reason }) => assert!(reason.contains("connection reset")),
        other => panic!("expected Fail, got {other:?}"),
    }
}

#[tokio::test]
async fn reconcile_task_honours_cancelled_scope() {
    let store = ScriptedStore::with([ManagedResource::new(&ns_a())]);
    let task = reconcile_task(Arc::new(reconciler(&store, NoopHooks)), ReconcileRequest::new(ns_a()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(task.spawn(cancel).await, Err(TaskError::Canceled)));
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
}
