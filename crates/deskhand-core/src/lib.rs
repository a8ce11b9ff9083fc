pub mod action;
pub mod actions;
pub mod config;
pub mod dispatch;
pub mod env_file;
pub mod error;
pub mod paths;
pub mod planner;
pub mod relay;
pub mod script;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionError, ActionRegistry, ActionSpec, DEFAULT_RESULT_LIMIT};
pub use config::{
    AgentSettings, BackendKind, ConfigWarning, ScriptingSettings, Settings, ToolErrorPolicy,
    WarnLevel,
};
pub use dispatch::{Dispatch, Dispatcher};
pub use env_file::EnvFile;
pub use error::{DeskhandError, Result};
pub use planner::{PlanError, PlanOutcome, Planner};
pub use relay::{Relay, RelayKind};
pub use script::{Interpreter, ScriptError, ScriptRunner};
