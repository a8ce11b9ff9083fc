//! The action capability interface and the canonical action registry.
//!
//! An action is a named, stateless OS-automation primitive with a uniform
//! JSON-in / string-out / may-fail signature. The registry owns the script
//! runner every action shells out through and applies one result-size policy
//! to every result, so individual actions never truncate on their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::script::{ScriptError, ScriptRunner};

/// Maximum characters of any action result handed back to the agent.
pub const DEFAULT_RESULT_LIMIT: usize = 4000;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    Unknown(String),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

pub trait Action: Send + Sync {
    fn name(&self) -> &str;
    /// Usage text shown to the reasoning agent.
    fn description(&self) -> &str;
    /// JSON schema of the accepted arguments.
    fn schema(&self) -> Value;
    /// Perform the action. Malformed input is reported through `Ok` with a
    /// descriptive message; only a failed script returns `Err`.
    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError>;
}

/// Name, description and schema of one action, as declared to an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

pub struct ActionRegistry {
    actions: BTreeMap<String, Box<dyn Action>>,
    scripts: Arc<dyn ScriptRunner>,
    limit: usize,
}

impl ActionRegistry {
    pub fn empty(scripts: Arc<dyn ScriptRunner>) -> Self {
        Self {
            actions: BTreeMap::new(),
            scripts,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// The full browser/editor catalog.
    pub fn standard(scripts: Arc<dyn ScriptRunner>) -> Self {
        let mut registry = Self::empty(scripts);
        for action in crate::actions::all_actions() {
            registry.register(action);
        }
        registry
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Add an action, replacing any earlier one with the same name.
    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.insert(action.name().to_string(), action);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    pub fn specs(&self) -> Vec<ActionSpec> {
        self.actions
            .values()
            .map(|a| ActionSpec {
                name: a.name().to_string(),
                description: a.description().to_string(),
                schema: a.schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run one action by name and apply the result-size policy.
    pub fn invoke(&self, name: &str, args: &Value) -> Result<String, ActionError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| ActionError::Unknown(name.to_string()))?;

        tracing::info!(action = name, %args, "invoking action");
        let output = action.call(args, self.scripts.as_ref())?;
        Ok(truncate_chars(output, self.limit))
    }

    /// The runner actions shell out through (shared with the speech relay).
    pub fn scripts(&self) -> Arc<dyn ScriptRunner> {
        Arc::clone(&self.scripts)
    }
}

/// Cut `text` to at most `limit` characters (Unicode scalar values).
pub fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => {
            let mut text = text;
            text.truncate(byte_idx);
            text
        }
        None => text,
    }
}

/// Read a string argument. A bare JSON string stands in for the action's
/// primary parameter, so single-string tool calls keep working.
pub fn text_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    match args {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    }
}

/// Message returned to the agent when a required argument is missing.
pub fn missing_arg(action: &str, key: &str) -> String {
    format!("Invalid input for {action}: missing required argument '{key}'.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_chars("abc".into(), 4000), "abc");
    }

    #[test]
    fn truncate_cuts_at_char_boundary() {
        let text = "é".repeat(10);
        let cut = truncate_chars(text, 4);
        assert_eq!(cut.chars().count(), 4);
        assert_eq!(cut, "éééé");
    }

    #[test]
    fn invoke_never_exceeds_limit() {
        let long = "x".repeat(DEFAULT_RESULT_LIMIT * 3);
        let runner = Arc::new(FakeRunner::replying(&long));
        let registry = ActionRegistry::standard(runner);
        for name in ["chrome_read_the_page", "chrome_get_the_links_on_the_page"] {
            let out = registry.invoke(name, &Value::Null).unwrap();
            assert_eq!(out.chars().count(), DEFAULT_RESULT_LIMIT);
        }
    }

    #[test]
    fn custom_limit_applies_to_every_action() {
        let runner = Arc::new(FakeRunner::replying("0123456789"));
        let registry = ActionRegistry::standard(runner).with_limit(3);
        let out = registry
            .invoke("computer_applescript_action", &Value::String("return 1".into()))
            .unwrap();
        assert_eq!(out, "012");
    }

    #[test]
    fn unknown_action_is_an_error() {
        let registry = ActionRegistry::standard(Arc::new(FakeRunner::replying("")));
        let err = registry.invoke("launch_rockets", &Value::Null).unwrap_err();
        assert!(matches!(err, ActionError::Unknown(ref n) if n == "launch_rockets"));
    }

    #[test]
    fn script_failure_propagates_out_of_registry() {
        let registry = ActionRegistry::standard(Arc::new(FakeRunner::failing(1, "boom")));
        let err = registry
            .invoke("chrome_open_url", &serde_json::json!({"url": "https://gmail.com"}))
            .unwrap_err();
        match err {
            ActionError::Script(ScriptError::Failed { code, stderr }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected script failure, got {other:?}"),
        }
    }

    #[test]
    fn standard_registry_lists_catalog() {
        let registry = ActionRegistry::standard(Arc::new(FakeRunner::replying("")));
        let names = registry.names();
        assert_eq!(registry.len(), 9);
        assert!(names.contains(&"chrome_open_url"));
        assert!(names.contains(&"select_lines_in_vs_code"));
        assert!(names.contains(&"computer_applescript_action"));
        let specs = registry.specs();
        assert!(specs.iter().all(|s| s.schema["type"] == "object"));
        assert!(specs.iter().all(|s| !s.description.is_empty()));
    }

    #[test]
    fn text_arg_accepts_bare_string_or_object() {
        let bare = Value::String("https://x".into());
        assert_eq!(text_arg(&bare, "url"), Some("https://x"));
        let obj = serde_json::json!({"url": "https://y"});
        assert_eq!(text_arg(&obj, "url"), Some("https://y"));
        assert_eq!(text_arg(&Value::Null, "url"), None);
    }
}
