use std::collections::HashMap;

use futures::{Stream, StreamExt};

use crate::stream::EventStream;
use crate::types::{Block, Launch, StreamEvent};
use crate::{AgentError, Result};

/// How a `claude` run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeRun {
    pub session_id: String,
    /// Final answer; empty unless the run succeeded.
    pub text: String,
    pub turns: u32,
    pub is_error: bool,
    /// A turn or budget limit ended the run.
    pub hit_limit: bool,
    pub errors: Vec<String>,
    /// Tools in the order the model called them.
    pub tools_called: Vec<String>,
    /// `(tool, message)` of the failed tool result that ended the run early.
    pub failed_tool: Option<(String, String)>,
}

/// Start `claude` with `prompt` and wait for its result.
///
/// With `abort_prefix` set, the first failed result of a tool whose name
/// starts with it ends the run; dropping the stream kills the process.
pub async fn run(launch: Launch, prompt: &str, abort_prefix: Option<&str>) -> Result<ClaudeRun> {
    collect(EventStream::start(launch, prompt), abort_prefix).await
}

/// Fold a run's events into a [`ClaudeRun`].
pub(crate) async fn collect<S>(mut events: S, abort_prefix: Option<&str>) -> Result<ClaudeRun>
where
    S: Stream<Item = Result<StreamEvent>> + Unpin,
{
    let mut tools_called = Vec::new();
    let mut names_by_id: HashMap<String, String> = HashMap::new();
    let mut turns = 0;

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::System(init) if init.is_init() => {
                let failed = init.failed_servers();
                if !failed.is_empty() {
                    tracing::warn!(servers = ?failed, "MCP servers failed to start");
                }
                tracing::debug!(session = %init.session_id, tools = init.tools.len(), "claude ready");
            }
            StreamEvent::Assistant(turn) => {
                for block in turn.message.content {
                    if let Block::ToolUse { id, name, input } = block {
                        tracing::info!(tool = %name, %input, "claude calling tool");
                        names_by_id.insert(id, name.clone());
                        tools_called.push(name);
                    }
                }
                turns += 1;
            }
            StreamEvent::User(echo) => {
                let Some(prefix) = abort_prefix else { continue };
                for failure in echo.failures() {
                    let Some(tool) = names_by_id.get(&failure.tool_use_id) else {
                        continue;
                    };
                    if tool.starts_with(prefix) {
                        tracing::warn!(%tool, message = %failure.message, "tool failed, ending run");
                        return Ok(ClaudeRun {
                            session_id: echo.session_id,
                            text: String::new(),
                            turns,
                            is_error: true,
                            hit_limit: false,
                            errors: vec![failure.message.clone()],
                            failed_tool: Some((tool.clone(), failure.message)),
                            tools_called,
                        });
                    }
                }
            }
            StreamEvent::Result(result) => {
                return Ok(ClaudeRun {
                    text: result.text().to_string(),
                    turns: result.num_turns,
                    is_error: result.is_error(),
                    hit_limit: result.hit_limit(),
                    session_id: result.session_id,
                    errors: result.errors,
                    tools_called,
                    failed_tool: None,
                });
            }
            StreamEvent::System(_) => {}
        }
    }

    Err(AgentError::Process("output ended before a result".into()))
}
