use std::str::FromStr;

use edgenet_model::CONTROLLER_FINALIZER;

use crate::error::ConfigError;

/// What the reconciler reports to the scheduler when a lifecycle hook fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookErrorPolicy {
    /// Surface the error without asking for a requeue; the next store change re-triggers.
    #[default]
    Surface,
    /// Surface the error and ask for a requeue. Only sound when hooks are idempotent.
    Requeue,
}

impl HookErrorPolicy {
    #[inline]
    pub fn requeue(&self) -> bool {
        matches!(self, HookErrorPolicy::Requeue)
    }
}

impl FromStr for HookErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "surface" => Ok(HookErrorPolicy::Surface),
            "requeue" => Ok(HookErrorPolicy::Requeue),
            _ => Err(ConfigError::InvalidHookErrorPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Lifecycle marker owned by this controller.
    pub finalizer: String,
    pub hook_error_policy: HookErrorPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            finalizer: CONTROLLER_FINALIZER.to_string(),
            hook_error_policy: HookErrorPolicy::default(),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.finalizer = finalizer.into();
        self
    }

    pub fn with_hook_error_policy(mut self, policy: HookErrorPolicy) -> Self {
        self.hook_error_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.finalizer.is_empty() || self.finalizer.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidFinalizer(self.finalizer.clone()));
        }
        Ok(())
    }
}
