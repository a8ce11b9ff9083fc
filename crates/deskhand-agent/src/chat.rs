//! OpenAI-compatible chat-completions wire types and transport.

use async_trait::async_trait;
use deskhand_core::ActionSpec;
use serde::{Deserialize, Serialize};

use crate::{AgentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn assistant_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Tool calls requested by this message, if any.
    pub fn calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as produced by the model.
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ActionSpec> for ToolDefinition {
    fn from(spec: &ActionSpec) -> Self {
        Self {
            kind: function_kind(),
            function: FunctionDefinition {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.schema.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

// ─── Transport ────────────────────────────────────────────────────────────

/// One chat-completions round trip: request in, assistant message out.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatMessage>;
}

/// `POST {base_url}/chat/completions` with a bearer token.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatMessage> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = resp.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Malformed("response has no choices".into()))?;
        tracing::debug!(finish_reason = ?choice.finish_reason, "chat completion");
        Ok(choice.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_parts() -> (Vec<ChatMessage>, Vec<ToolDefinition>) {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("open gmail")];
        let spec = ActionSpec {
            name: "chrome_open_url".into(),
            description: "Open a URL".into(),
            schema: json!({"type": "object"}),
        };
        (messages, vec![ToolDefinition::from(&spec)])
    }

    #[test]
    fn request_serializes_tools_as_functions() {
        let (messages, tools) = request_parts();
        let req = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
            tools: &tools,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["temperature"], json!(0.0));
        assert_eq!(v["messages"][1]["role"], "user");
        assert!(v["messages"][0].get("tool_calls").is_none());
        assert_eq!(v["tools"][0]["type"], "function");
        assert_eq!(v["tools"][0]["function"]["name"], "chrome_open_url");
    }

    #[test]
    fn request_without_tools_omits_field() {
        let messages = vec![ChatMessage::user("hi")];
        let req = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            tools: &[],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tools").is_none());
    }

    #[test]
    fn response_with_tool_calls_parses() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "hello_world", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let resp: ChatResponse = serde_json::from_value(body).unwrap();
        let msg = &resp.choices[0].message;
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, None);
        assert_eq!(msg.calls()[0].function.name, "hello_world");
    }

    #[tokio::test]
    async fn http_transport_posts_with_bearer_and_returns_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "All done."},
                        "finish_reason": "stop"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let transport = HttpTransport::new(format!("{}/", server.url()), "sk-test");
        let (messages, tools) = request_parts();
        let reply = transport
            .complete(&ChatRequest {
                model: "gpt-4o-mini",
                messages: &messages,
                temperature: 0.0,
                tools: &tools,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.content.as_deref(), Some("All done."));
    }

    #[tokio::test]
    async fn http_transport_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "bad");
        let messages = vec![ChatMessage::user("hi")];
        let err = transport
            .complete(&ChatRequest {
                model: "m",
                messages: &messages,
                temperature: 0.0,
                tools: &[],
            })
            .await
            .unwrap_err();

        match err {
            AgentError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
