//! Chat-completions tool loop.
//!
//! Each step sends the running conversation plus every registry action as a
//! function tool. Tool calls in the reply are executed in order and their
//! results appended as `tool` messages; a reply without tool calls is the
//! final answer. The loop gives up after `max_steps` round trips.

use async_trait::async_trait;
use deskhand_core::{
    ActionError, ActionRegistry, AgentSettings, PlanError, PlanOutcome, Planner, ToolErrorPolicy,
};
use serde_json::Value;

use crate::chat::{ChatMessage, ChatRequest, ChatTransport, HttpTransport, ToolCall, ToolDefinition};
use crate::prompt::system_prompt;

pub const BACKEND: &str = "openai";

/// Outcome text when the step limit ends the run.
pub const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

pub struct ChatCompletionsPlanner {
    transport: Box<dyn ChatTransport>,
    model: String,
    temperature: f32,
    max_steps: u32,
    tool_errors: ToolErrorPolicy,
}

impl ChatCompletionsPlanner {
    pub fn new(transport: Box<dyn ChatTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            temperature: 0.0,
            max_steps: 15,
            tool_errors: ToolErrorPolicy::Fail,
        }
    }

    /// HTTP-backed planner configured from `agent`.
    pub fn from_settings(agent: &AgentSettings, api_key: impl Into<String>) -> Self {
        let transport = HttpTransport::new(agent.base_url.clone(), api_key);
        Self::new(Box::new(transport), agent.model())
            .with_temperature(agent.temperature)
            .with_max_steps(agent.max_steps)
            .with_tool_errors(agent.tool_errors)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tool_errors(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_errors = policy;
        self
    }

    /// Run one tool call. `Ok` carries the text handed back to the model.
    fn call_action(&self, call: &ToolCall, actions: &ActionRegistry) -> Result<String, PlanError> {
        let name = call.function.name.as_str();
        let args = parse_arguments(&call.function.arguments);
        tracing::info!(action = name, args = %call.function.arguments, "agent calling action");

        match actions.invoke(name, &args) {
            Ok(output) => Ok(output),
            // The model picked a name outside the catalog; let it choose again.
            Err(ActionError::Unknown(_)) => Ok(format!(
                "{name} is not a valid action, try one of [{}].",
                actions.names().join(", ")
            )),
            Err(e) => match self.tool_errors {
                ToolErrorPolicy::Fail => Err(PlanError::Action {
                    action: name.to_string(),
                    source: e,
                }),
                ToolErrorPolicy::Report => {
                    tracing::warn!(action = name, error = %e, "action failed, reporting to agent");
                    Ok(format!("Error: {e}"))
                }
            },
        }
    }
}

/// Tool arguments as JSON; anything that does not parse is passed through as
/// the action's primary string parameter.
fn parse_arguments(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl Planner for ChatCompletionsPlanner {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn run(&self, command: &str, actions: &ActionRegistry) -> Result<PlanOutcome, PlanError> {
        let tools: Vec<ToolDefinition> = actions.specs().iter().map(ToolDefinition::from).collect();
        let mut messages = vec![
            ChatMessage::system(system_prompt(actions)),
            ChatMessage::user(command),
        ];

        for step in 1..=self.max_steps {
            tracing::debug!(step, model = %self.model, "agent step");
            let request = ChatRequest {
                model: &self.model,
                messages: &messages,
                temperature: self.temperature,
                tools: &tools,
            };
            let reply = self
                .transport
                .complete(&request)
                .await
                .map_err(|e| e.into_plan(BACKEND))?;

            if reply.calls().is_empty() {
                let text = reply.content.unwrap_or_default();
                return Ok(PlanOutcome::finished(text, step));
            }

            let calls = reply.calls().to_vec();
            messages.push(ChatMessage::assistant_calls(reply.content, calls.clone()));
            for call in &calls {
                let output = self.call_action(call, actions)?;
                messages.push(ChatMessage::tool(call.id.clone(), output));
            }
        }

        tracing::warn!(max_steps = self.max_steps, "agent hit the step limit");
        Ok(PlanOutcome {
            text: STOPPED_MESSAGE.to_string(),
            steps: self.max_steps,
            stopped_early: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::FunctionCall;
    use crate::{AgentError, Result};
    use deskhand_core::{ScriptError, ScriptRunner};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned replies and records every request's messages.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<ChatMessage>>,
        seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<ChatMessage>) -> (Self, Arc<Mutex<Vec<Vec<ChatMessage>>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let t = Self {
                replies: Mutex::new(replies.into()),
                seen: seen.clone(),
            };
            (t, seen)
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatMessage> {
            self.seen.lock().unwrap().push(request.messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Malformed("no scripted reply left".into()))
        }
    }

    struct Recorder {
        scripts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptRunner for Recorder {
        fn run(&self, script: &str) -> std::result::Result<String, ScriptError> {
            self.scripts.lock().unwrap().push(script.to_string());
            if self.fail {
                Err(ScriptError::Failed {
                    code: Some(1),
                    stderr: "Google Chrome got an error".into(),
                })
            } else {
                Ok(String::new())
            }
        }
    }

    fn registry(fail: bool) -> (ActionRegistry, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            scripts: Mutex::new(Vec::new()),
            fail,
        });
        (ActionRegistry::standard(recorder.clone()), recorder)
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            kind: "function".into(),
            function: FunctionCall {
                name: name.into(),
                arguments: args.into(),
            },
        }
    }

    #[tokio::test]
    async fn final_answer_without_tool_calls() {
        let (t, seen) = ScriptedTransport::new(vec![ChatMessage::assistant("Paris")]);
        let (actions, _) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        let outcome = planner.run("capital of France?", &actions).await.unwrap();
        assert_eq!(outcome, PlanOutcome::finished("Paris", 1));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][1].content.as_deref(), Some("capital of France?"));
    }

    #[tokio::test]
    async fn tool_calls_run_in_order_and_feed_back() {
        let (t, seen) = ScriptedTransport::new(vec![
            ChatMessage::assistant_calls(
                None,
                vec![
                    call("c1", "chrome_open_url", r#"{"url":"https://mail.google.com"}"#),
                    call("c2", "hello_world", "{}"),
                ],
            ),
            ChatMessage::assistant("Opened gmail."),
        ]);
        let (actions, recorder) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        let outcome = planner.run("open gmail", &actions).await.unwrap();
        assert_eq!(outcome.text, "Opened gmail.");
        assert_eq!(outcome.steps, 2);

        // hello_world never shells out, so only the URL open hit the runner.
        let scripts = recorder.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("https://mail.google.com"));

        let seen = seen.lock().unwrap();
        let second = &seen[1];
        assert_eq!(second.len(), 5);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(second[3].content.as_deref(), Some("opened https://mail.google.com"));
        assert_eq!(second[4].tool_call_id.as_deref(), Some("c2"));
        assert_eq!(second[4].content.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn non_json_arguments_pass_as_primary_parameter() {
        let (t, seen) = ScriptedTransport::new(vec![
            ChatMessage::assistant_calls(None, vec![call("c1", "select_lines_in_vs_code", "10:15")]),
            ChatMessage::assistant("Selected."),
        ]);
        let (actions, recorder) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        planner.run("select lines 10 to 15", &actions).await.unwrap();
        assert!(recorder.scripts.lock().unwrap()[0].contains("repeat 5 times"));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[1][3].content.as_deref(), Some("lines have been selected"));
    }

    #[tokio::test]
    async fn step_limit_yields_stop_message() {
        let looping = ChatMessage::assistant_calls(None, vec![call("c", "hello_world", "{}")]);
        let (t, _) = ScriptedTransport::new(vec![looping.clone(), looping.clone(), looping]);
        let (actions, _) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m").with_max_steps(3);

        let outcome = planner.run("loop forever", &actions).await.unwrap();
        assert!(outcome.stopped_early);
        assert_eq!(outcome.steps, 3);
        assert_eq!(outcome.text, STOPPED_MESSAGE);
    }

    #[tokio::test]
    async fn fail_policy_propagates_action_error() {
        let (t, seen) = ScriptedTransport::new(vec![
            ChatMessage::assistant_calls(None, vec![call("c1", "chrome_read_the_page", "{}")]),
            ChatMessage::assistant("unreachable"),
        ]);
        let (actions, _) = registry(true);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        let err = planner.run("read the page", &actions).await.unwrap_err();
        match err {
            PlanError::Action { action, source } => {
                assert_eq!(action, "chrome_read_the_page");
                assert!(source.to_string().contains("Google Chrome got an error"));
            }
            other => panic!("expected action error, got {other:?}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn report_policy_feeds_error_back() {
        let (t, seen) = ScriptedTransport::new(vec![
            ChatMessage::assistant_calls(None, vec![call("c1", "chrome_read_the_page", "{}")]),
            ChatMessage::assistant("Chrome is not open."),
        ]);
        let (actions, _) = registry(true);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m")
            .with_tool_errors(ToolErrorPolicy::Report);

        let outcome = planner.run("read the page", &actions).await.unwrap();
        assert_eq!(outcome.text, "Chrome is not open.");
        let seen = seen.lock().unwrap();
        let fed_back = seen[1][3].content.as_deref().unwrap();
        assert!(fed_back.starts_with("Error: "));
    }

    #[tokio::test]
    async fn unknown_action_is_reported_to_the_model() {
        let (t, seen) = ScriptedTransport::new(vec![
            ChatMessage::assistant_calls(None, vec![call("c1", "launch_rockets", "{}")]),
            ChatMessage::assistant("I can't do that."),
        ]);
        let (actions, _) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        planner.run("launch", &actions).await.unwrap();
        let seen = seen.lock().unwrap();
        let fed_back = seen[1][3].content.as_deref().unwrap();
        assert!(fed_back.starts_with("launch_rockets is not a valid action"));
    }

    #[tokio::test]
    async fn transport_failure_is_backend_error() {
        let (t, _) = ScriptedTransport::new(vec![]);
        let (actions, _) = registry(false);
        let planner = ChatCompletionsPlanner::new(Box::new(t), "m");

        let err = planner.run("anything", &actions).await.unwrap_err();
        assert!(matches!(err, PlanError::Backend { ref backend, .. } if backend == "openai"));
    }

    #[test]
    fn arguments_parse_or_fall_back() {
        assert_eq!(parse_arguments(""), Value::Null);
        assert_eq!(parse_arguments(r#"{"a":1}"#)["a"], 1);
        assert_eq!(parse_arguments("10:15"), Value::String("10:15".into()));
    }
}
