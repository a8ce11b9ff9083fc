//! Planner backed by the `claude` CLI.
//!
//! The CLI does the planning; the actions reach it through an MCP stdio
//! server (`deskhand mcp`) that the CLI spawns for the run. Only that
//! server's tools are allowed and nothing else is approved.

use std::collections::HashMap;

use async_trait::async_trait;
use deskhand_core::{
    ActionRegistry, AgentSettings, PlanError, PlanOutcome, Planner, ToolErrorPolicy,
};

use crate::openai::STOPPED_MESSAGE;
use crate::prompt::system_prompt;
use crate::runner::{self, ClaudeRun};
use crate::types::{Launch, McpServer};

pub const BACKEND: &str = "claude_cli";

/// Name the action server is registered under; tools become `mcp__deskhand__<action>`.
pub const MCP_SERVER_NAME: &str = "deskhand";

pub struct ClaudeCliPlanner {
    model: Option<String>,
    max_turns: u32,
    executable: Option<String>,
    server: McpServer,
    env: HashMap<String, String>,
    tool_errors: ToolErrorPolicy,
}

impl ClaudeCliPlanner {
    /// `server_command` and `server_args` start the action server, e.g.
    /// the current executable with `mcp`.
    pub fn new(server_command: impl Into<String>, server_args: Vec<String>) -> Self {
        Self {
            model: None,
            max_turns: 15,
            executable: None,
            server: McpServer {
                name: MCP_SERVER_NAME.to_string(),
                command: server_command.into(),
                args: server_args,
            },
            env: HashMap::new(),
            tool_errors: ToolErrorPolicy::default(),
        }
    }

    pub fn from_settings(
        agent: &AgentSettings,
        server_command: impl Into<String>,
        server_args: Vec<String>,
    ) -> Self {
        let mut planner = Self::new(server_command, server_args);
        planner.model = Some(agent.model().to_string());
        planner.max_turns = agent.max_steps;
        planner.executable = agent.claude_path.clone();
        planner.tool_errors = agent.tool_errors;
        planner
    }

    /// Under [`ToolErrorPolicy::Fail`] the first failed action ends the run.
    pub fn with_tool_errors(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_errors = policy;
        self
    }

    /// Tool-name prefix whose failures end the run, if any.
    fn abort_prefix(&self) -> Option<String> {
        match self.tool_errors {
            ToolErrorPolicy::Fail => Some(self.server.tool_name("")),
            ToolErrorPolicy::Report => None,
        }
    }

    /// Extra environment for the `claude` process, e.g. an API key read from
    /// the env file.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub(crate) fn launch(&self, actions: &ActionRegistry) -> Launch {
        Launch {
            executable: self.executable.clone(),
            model: self.model.clone(),
            max_turns: Some(self.max_turns),
            system_prompt: Some(system_prompt(actions)),
            allowed_tools: actions
                .names()
                .into_iter()
                .map(|name| self.server.tool_name(name))
                .collect(),
            dont_ask: true,
            mcp_server: Some(self.server.clone()),
            env: self.env.clone(),
        }
    }
}

/// Map the CLI's terminal result onto a planner outcome.
pub(crate) fn outcome_from(result: ClaudeRun) -> Result<PlanOutcome, PlanError> {
    if let Some((tool, message)) = result.failed_tool {
        let action = tool.rsplit("__").next().unwrap_or(&tool);
        return Err(PlanError::backend(
            BACKEND,
            format!("action '{action}' failed: {message}"),
        ));
    }
    if result.hit_limit {
        return Ok(PlanOutcome {
            text: STOPPED_MESSAGE.to_string(),
            steps: result.turns,
            stopped_early: true,
        });
    }
    if result.is_error {
        let detail = if result.errors.is_empty() {
            "run ended with an error".to_string()
        } else {
            result.errors.join("; ")
        };
        return Err(PlanError::backend(BACKEND, detail));
    }
    Ok(PlanOutcome::finished(result.text, result.turns))
}

#[async_trait]
impl Planner for ClaudeCliPlanner {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn run(&self, command: &str, actions: &ActionRegistry) -> Result<PlanOutcome, PlanError> {
        let launch = self.launch(actions);
        tracing::info!(
            model = launch.model.as_deref().unwrap_or("default"),
            max_turns = self.max_turns,
            tool_errors = ?self.tool_errors,
            "starting claude"
        );
        let prefix = self.abort_prefix();
        let result = runner::run(launch, command, prefix.as_deref())
            .await
            .map_err(|e| e.into_plan(BACKEND))?;
        tracing::info!(
            session = %result.session_id,
            turns = result.turns,
            tools = ?result.tools_called,
            "claude finished"
        );
        outcome_from(result)
    }
}
