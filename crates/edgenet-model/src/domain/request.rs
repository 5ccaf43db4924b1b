use std::fmt;

use crate::NamespacedName;

/// A single reconciliation request delivered by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub id: NamespacedName,
    /// Why the request was produced ("watch", "requeue", ...). Informational only.
    pub trigger: Option<String>,
}

impl ReconcileRequest {
    pub fn new(id: NamespacedName) -> Self {
        Self { id, trigger: None }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }
}

impl From<NamespacedName> for ReconcileRequest {
    fn from(id: NamespacedName) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ReconcileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.trigger {
            Some(t) => write!(f, "{} ({t})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
