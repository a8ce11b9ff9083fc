use crate::action::DEFAULT_RESULT_LIMIT;
use crate::env_file::EnvFile;
use crate::error::{DeskhandError, Result};
use crate::paths;
use crate::relay::RelayKind;
use crate::script::Interpreter;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendKind / ToolErrorPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI-compatible chat-completions tool loop.
    #[default]
    Openai,
    /// The `claude` CLI in stream-json mode.
    ClaudeCli,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Openai => "openai",
            BackendKind::ClaudeCli => "claude_cli",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "openai" => Some(BackendKind::Openai),
            "claude_cli" | "claude" => Some(BackendKind::ClaudeCli),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Openai => "gpt-4o-mini",
            BackendKind::ClaudeCli => "claude-sonnet-4-6",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            BackendKind::Openai => "OPENAI_API_KEY",
            BackendKind::ClaudeCli => "ANTHROPIC_API_KEY",
        }
    }
}

/// What a planner does when an action fails mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorPolicy {
    /// End the run with the action's error.
    #[default]
    Fail,
    /// Hand `Error: <message>` back to the model and keep going.
    Report,
}

// ---------------------------------------------------------------------------
// AgentSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub backend: BackendKind,
    /// Falls back to the backend's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to the backend's conventional variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub tool_errors: ToolErrorPolicy,
    /// Path to the `claude` executable; `PATH` lookup when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_path: Option<String>,
}

fn default_max_steps() -> u32 {
    15
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model: None,
            temperature: 0.0,
            max_steps: default_max_steps(),
            base_url: default_base_url(),
            api_key_env: None,
            tool_errors: ToolErrorPolicy::default(),
            claude_path: None,
        }
    }
}

impl AgentSettings {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.backend.default_api_key_env())
    }

    /// Credential from the process environment or the env file.
    pub fn api_key(&self, env: &EnvFile) -> Result<String> {
        let var = self.api_key_env();
        env.lookup(var)
            .ok_or_else(|| DeskhandError::MissingCredential(var.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ScriptingSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptingSettings {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_interpreter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

fn default_interpreter() -> String {
    Interpreter::DEFAULT_PROGRAM.to_string()
}

fn default_interpreter_args() -> Vec<String> {
    vec!["-".to_string()]
}

fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

impl Default for ScriptingSettings {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            args: default_interpreter_args(),
            result_limit: default_result_limit(),
        }
    }
}

impl ScriptingSettings {
    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(self.interpreter.clone(), self.args.clone())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub scripting: ScriptingSettings,
    #[serde(default)]
    pub relay: RelayKind,
}

impl Settings {
    /// Load `deskhand.yaml` from `root`; defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_file(&paths::config_path(root))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(&data)
            .map_err(|e| DeskhandError::Config(format!("{}: {e}", path.display())))?;
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.agent.temperature > 0.0 {
            warnings.push(ConfigWarning::warning(format!(
                "agent.temperature is {}; action selection is no longer deterministic",
                self.agent.temperature
            )));
        }

        if self.agent.max_steps == 0 {
            warnings.push(ConfigWarning::error(
                "agent.max_steps is 0; the agent cannot take a single step",
            ));
        }

        if self.scripting.result_limit == 0 {
            warnings.push(ConfigWarning::error(
                "scripting.result_limit is 0; every action result will be empty",
            ));
        }

        if !self.scripting.interpreter().is_available() {
            warnings.push(ConfigWarning::warning(format!(
                "scripting interpreter '{}' not found on PATH",
                self.scripting.interpreter
            )));
        }

        if self.agent.backend == BackendKind::Openai && self.agent.base_url.trim().is_empty() {
            warnings.push(ConfigWarning::error("agent.base_url is empty"));
        }

        warnings
    }
}
