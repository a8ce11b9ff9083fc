//! Typed events of `claude --output-format stream-json`, cut down to what the
//! planner reads. Undeclared fields are ignored on deserialization.

use serde::Deserialize;
use std::collections::HashMap;

/// One JSONL line, discriminated by `"type"`. Types not listed here
/// (`stream_event`, `tool_progress`, `rate_limit_event`, ...) are skipped by
/// the reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    System(SystemEvent),
    Assistant(AssistantTurn),
    User(ToolEcho),
    Result(FinalResult),
}

impl StreamEvent {
    pub fn session_id(&self) -> &str {
        match self {
            StreamEvent::System(e) => &e.session_id,
            StreamEvent::Assistant(e) => &e.session_id,
            StreamEvent::User(e) => &e.session_id,
            StreamEvent::Result(e) => &e.session_id,
        }
    }
}

/// `type = "system"`. Only `init` carries the model, tools and server states.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemEvent {
    pub subtype: String,
    pub session_id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub mcp_servers: Vec<ServerState>,
}

impl SystemEvent {
    pub fn is_init(&self) -> bool {
        self.subtype == "init"
    }

    /// Names of MCP servers the CLI did not manage to start.
    pub fn failed_servers(&self) -> Vec<&str> {
        self.mcp_servers
            .iter()
            .filter(|s| s.status != "connected")
            .map(|s| s.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerState {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantTurn {
    pub session_id: String,
    pub message: TurnBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TurnBody {
    #[serde(default)]
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text { text: String },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// `type = "user"`: tool results the CLI echoes back.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolEcho {
    pub session_id: String,
    #[serde(default)]
    pub message: serde_json::Value,
}

/// A `tool_result` block flagged `is_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub tool_use_id: String,
    pub message: String,
}

impl ToolEcho {
    /// Results the tool reported as errors. Content is either a string or a
    /// list of text items.
    pub fn failures(&self) -> Vec<ToolFailure> {
        let Some(blocks) = self.message.get("content").and_then(|c| c.as_array()) else {
            return Vec::new();
        };
        blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_result"))
            .filter(|b| b.get("is_error").and_then(|e| e.as_bool()) == Some(true))
            .map(|b| ToolFailure {
                tool_use_id: b
                    .get("tool_use_id")
                    .and_then(|id| id.as_str())
                    .unwrap_or_default()
                    .to_string(),
                message: result_text(b.get("content")),
            })
            .collect()
    }
}

fn result_text(content: Option<&serde_json::Value>) -> String {
    match content {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// The last event of every run.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalResult {
    pub subtype: ResultKind,
    pub session_id: String,
    /// Present on success only.
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Success,
    ErrorDuringExecution,
    ErrorMaxTurns,
    ErrorMaxBudgetUsd,
    #[serde(other)]
    ErrorUnknown,
}

impl FinalResult {
    pub fn is_error(&self) -> bool {
        self.subtype != ResultKind::Success
    }

    /// A turn or budget limit ended the run.
    pub fn hit_limit(&self) -> bool {
        matches!(
            self.subtype,
            ResultKind::ErrorMaxTurns | ResultKind::ErrorMaxBudgetUsd
        )
    }

    pub fn text(&self) -> &str {
        self.result.as_deref().unwrap_or("")
    }
}

// ─── Launch options ───────────────────────────────────────────────────────

/// How to start one `claude` run.
#[derive(Debug, Clone, Default)]
pub struct Launch {
    /// `claude` on `PATH` when unset.
    pub executable: Option<String>,
    pub model: Option<String>,
    /// The run ends with `error_max_turns` past this.
    pub max_turns: Option<u32>,
    pub system_prompt: Option<String>,
    /// Tools approved without asking. With `dont_ask`, nothing else runs.
    pub allowed_tools: Vec<String>,
    pub dont_ask: bool,
    pub mcp_server: Option<McpServer>,
    pub env: HashMap<String, String>,
}

/// A stdio MCP server the CLI starts for the run. Its tools are addressed
/// as `mcp__<name>__<tool>`.
#[derive(Debug, Clone)]
pub struct McpServer {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

impl McpServer {
    pub fn tool_name(&self, tool: &str) -> String {
        format!("mcp__{}__{}", self.name, tool)
    }

    /// Value of `--mcp-config`.
    pub fn config_json(&self) -> String {
        let mut servers = serde_json::Map::new();
        servers.insert(
            self.name.clone(),
            serde_json::json!({
                "type": "stdio",
                "command": self.command,
                "args": self.args,
            }),
        );
        serde_json::json!({ "mcpServers": servers }).to_string()
    }
}
