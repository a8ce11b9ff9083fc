use thiserror::Error;

use crate::action::ActionError;
use crate::planner::PlanError;
use crate::script::ScriptError;

#[derive(Debug, Error)]
pub enum DeskhandError {
    #[error("empty command: nothing to hand to the agent")]
    EmptyCommand,

    #[error("missing credential: set {0} in the environment or the env file")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("relay failed: {0}")]
    Relay(#[source] ScriptError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeskhandError>;
