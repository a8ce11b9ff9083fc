//! The reasoning-agent boundary.
//!
//! A [`Planner`] turns one natural-language command into a sequence of action
//! invocations and a final answer. How it plans is opaque to this crate; each
//! backend owns its own termination policy (step or turn limit).

use async_trait::async_trait;
use thiserror::Error;

use crate::action::{ActionError, ActionRegistry};

/// Final answer of a planner run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub text: String,
    /// Model round trips (or CLI turns) the run used.
    pub steps: u32,
    /// True when the backend's own limit ended the run before a final answer.
    pub stopped_early: bool,
}

impl PlanOutcome {
    pub fn finished(text: impl Into<String>, steps: u32) -> Self {
        Self {
            text: text.into(),
            steps,
            stopped_early: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    /// An action failed and the backend chose to end the run.
    #[error("action '{action}' failed: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("{backend}: {message}")]
    Backend { backend: String, message: String },
}

impl PlanError {
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Planner: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &str;

    async fn run(&self, command: &str, actions: &ActionRegistry) -> Result<PlanOutcome, PlanError>;
}
