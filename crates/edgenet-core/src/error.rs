use edgenet_model::{NamespacedName, ResourceVersion};
use thiserror::Error;

/// Failures reported by a [`crate::ResourceStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(NamespacedName),
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: NamespacedName,
        expected: ResourceVersion,
        actual: ResourceVersion,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("canceled")]
    Canceled,
}

impl StoreError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    #[inline]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Everything except `NotFound` is worth another attempt from a fresh fetch.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !self.is_not_found()
    }
}

/// Failure returned by a lifecycle hook.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("hook failed: {0}")]
    Failed(String),
}

impl HookError {
    pub fn new(reason: impl Into<String>) -> Self {
        HookError::Failed(reason.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl ReconcileError {
    /// Whether the failure is known to be transient.
    ///
    /// Hook failures are opaque to the controller and always report `false` here, regardless of
    /// [`HookErrorPolicy`](crate::HookErrorPolicy). Whether a given outcome is requeued is decided by
    /// [`ReconcileOutcome::requeue`](crate::ReconcileOutcome::requeue), not by this method.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Store(e) => e.is_retryable(),
            ReconcileError::Hook(_) => false,
        }
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, ReconcileError::Store(StoreError::Canceled))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid finalizer name: {0:?} (must be non-empty without whitespace)")]
    InvalidFinalizer(String),
    #[error("invalid hook error policy: {0} (expected: surface|requeue)")]
    InvalidHookErrorPolicy(String),
}
