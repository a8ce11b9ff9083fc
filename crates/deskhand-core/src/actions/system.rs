use serde_json::Value;

use super::no_args_schema;
use crate::action::{missing_arg, text_arg, Action, ActionError};
use crate::script::ScriptRunner;

/// Escape hatch: run an arbitrary AppleScript supplied by the agent.
pub struct AppleScriptAction;

impl Action for AppleScriptAction {
    fn name(&self) -> &str {
        "computer_applescript_action"
    }

    fn description(&self) -> &str {
        "Use this when you want to do something on the computer that the other tools cannot \
         do. The input is an AppleScript program, for example: \
         tell application \"Calculator\" to activate. Returns the script output."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "script": {
                    "type": "string",
                    "description": "AppleScript source to run"
                }
            },
            "required": ["script"]
        })
    }

    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        let Some(script) = text_arg(args, "script").filter(|s| !s.trim().is_empty()) else {
            return Ok(missing_arg(self.name(), "script"));
        };
        Ok(scripts.run(script)?)
    }
}

pub struct HelloWorld;

impl Action for HelloWorld {
    fn name(&self) -> &str {
        "hello_world"
    }

    fn description(&self) -> &str {
        "Log hello world to the console."
    }

    fn schema(&self) -> Value {
        no_args_schema()
    }

    fn call(&self, _args: &Value, _scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        tracing::info!("hello world");
        Ok("hello world".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    #[test]
    fn applescript_passes_source_through_verbatim() {
        let runner = FakeRunner::replying("42");
        let out = AppleScriptAction
            .call(&serde_json::json!({"script": "return 6 * 7"}), &runner)
            .unwrap();
        assert_eq!(out, "42");
        assert_eq!(runner.last_script(), "return 6 * 7");
    }

    #[test]
    fn applescript_requires_a_script() {
        let runner = FakeRunner::replying("");
        let out = AppleScriptAction.call(&Value::Null, &runner).unwrap();
        assert!(out.contains("'script'"));
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn hello_world_never_shells_out() {
        let runner = FakeRunner::replying("");
        assert_eq!(HelloWorld.call(&Value::Null, &runner).unwrap(), "hello world");
        assert_eq!(runner.calls(), 0);
    }
}
