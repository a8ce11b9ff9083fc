use anyhow::Result;
use deskhand_core::{ActionError, ActionRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};

use super::Workspace;

// ─── JSON-RPC 2.0 ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct RpcReply {
    jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

impl RpcReply {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

// ─── stdio loop ───────────────────────────────────────────────────────────

/// Serve the action registry over stdio until stdin closes.
pub fn run(ws: &Workspace) -> Result<()> {
    let actions = ws.registry();
    tracing::info!(actions = actions.len(), "mcp server ready");
    serve(std::io::stdin().lock(), std::io::stdout().lock(), &actions)
}

/// One response line per request line. Notifications (no `id`) get none.
pub fn serve<R: BufRead, W: Write>(input: R, mut output: W, actions: &ActionRegistry) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = respond_to_line(&line, actions) {
            serde_json::to_writer(&mut output, &response)?;
            writeln!(output)?;
            output.flush()?;
        }
    }
    Ok(())
}

fn respond_to_line(line: &str, actions: &ActionRegistry) -> Option<RpcReply> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return Some(RpcReply::err(
                None,
                PARSE_ERROR,
                format!("parse error: {e}"),
            ))
        }
    };

    if !raw.as_object().is_some_and(|o| o.contains_key("id")) {
        if let Some(method) = raw.get("method").and_then(Value::as_str) {
            tracing::debug!(method, "notification");
        }
        return None;
    }

    match serde_json::from_value::<RpcRequest>(raw) {
        Ok(request) => Some(handle_request(&request, actions)),
        Err(e) => Some(RpcReply::err(
            None,
            INVALID_REQUEST,
            format!("invalid request: {e}"),
        )),
    }
}

// ─── methods ──────────────────────────────────────────────────────────────

pub fn handle_request(req: &RpcRequest, actions: &ActionRegistry) -> RpcReply {
    let id = req.id.clone();
    match req.method.as_str() {
        "initialize" => RpcReply::ok(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "deskhand",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "ping" => RpcReply::ok(id, json!({})),

        "tools/list" => {
            let tools: Vec<Value> = actions
                .specs()
                .into_iter()
                .map(|s| {
                    json!({
                        "name": s.name,
                        "description": s.description,
                        "inputSchema": s.schema
                    })
                })
                .collect();
            RpcReply::ok(id, json!({ "tools": tools }))
        }

        "tools/call" => {
            let Some(params) = &req.params else {
                return RpcReply::err(id, INVALID_PARAMS, "missing params");
            };
            let Some(name) = params["name"].as_str() else {
                return RpcReply::err(id, INVALID_PARAMS, "missing tool name in params");
            };
            let args = params.get("arguments").cloned().unwrap_or(Value::Null);

            let (text, is_error) = match actions.invoke(name, &args) {
                Ok(text) => (text, false),
                Err(ActionError::Unknown(_)) => {
                    return RpcReply::err(
                        id,
                        METHOD_NOT_FOUND,
                        format!("tool not found: {name}"),
                    )
                }
                Err(e) => {
                    tracing::warn!(action = name, error = %e, "tool call failed");
                    (e.to_string(), true)
                }
            };
            RpcReply::ok(
                id,
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": is_error
                }),
            )
        }

        other => RpcReply::err(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
    }
}
