pub mod error;
pub use error::{ConfigError, HookError, ReconcileError, StoreError};

pub mod store;
pub use store::{MemoryStore, ResourceStore};

pub mod finalizer;
pub use finalizer::{Acquisition, FinalizerGuard};

pub mod hooks;
pub use hooks::{LifecycleHooks, NoopHooks};

pub mod reconciler;
pub use reconciler::{HookErrorPolicy, ReconcileOutcome, Reconciler, ReconcilerConfig};

pub mod task;
pub use task::reconcile_task;
