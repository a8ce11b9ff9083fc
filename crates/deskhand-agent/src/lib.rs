//! `deskhand-agent`: reasoning-agent backends behind the
//! [`deskhand_core::Planner`] trait.
//!
//! ```text
//! ChatCompletionsPlanner  ← POST /chat/completions, tool calls executed
//!                           in-process through the ActionRegistry
//! ClaudeCliPlanner        ← spawns `claude --output-format stream-json`,
//!                           actions served back to it by `deskhand mcp`
//! ```

pub mod chat;
pub mod claude;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod runner;
pub mod stream;
pub mod types;

pub(crate) mod process;


pub use chat::{ChatTransport, HttpTransport};
pub use claude::ClaudeCliPlanner;
pub use error::AgentError;
pub use openai::{ChatCompletionsPlanner, STOPPED_MESSAGE};
pub use runner::ClaudeRun;
pub use stream::EventStream;

pub type Result<T> = std::result::Result<T, AgentError>;
