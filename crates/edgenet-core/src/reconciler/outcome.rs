use crate::error::ReconcileError;

/// What a single reconciliation tells the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Ask the scheduler to run this identifier again (with its own backoff).
    pub requeue: bool,
    pub error: Option<ReconcileError>,
}

impl ReconcileOutcome {
    /// Nothing left to do.
    #[inline]
    pub fn done() -> Self {
        Self::default()
    }

    /// Incomplete; run again from a fresh fetch.
    pub fn retry(error: impl Into<ReconcileError>) -> Self {
        Self {
            requeue: true,
            error: Some(error.into()),
        }
    }

    pub fn failed(error: impl Into<ReconcileError>, requeue: bool) -> Self {
        Self {
            requeue,
            error: Some(error.into()),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.requeue
    }
}
