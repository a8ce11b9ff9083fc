//! The `claude` child process.
//!
//! stdin:  one stream-json user message carrying the prompt, then EOF
//! stdout: JSONL [`StreamEvent`]s, ending with a `result`
//! stderr: collected in the background and attached to exit errors

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::types::{Launch, StreamEvent};
use crate::{AgentError, Result};

pub(crate) struct CliChild {
    child: Child,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
}

impl CliChild {
    /// Start `claude` for `launch` and hand it `prompt`.
    pub(crate) async fn start(launch: &Launch, prompt: &str) -> Result<Self> {
        let mut cmd = Command::new(launch.executable.as_deref().unwrap_or("claude"));
        cmd.args(launch_args(launch)).envs(&launch.env);
        // Allows starting the CLI from inside another Claude session.
        cmd.env_remove("CLAUDECODE");

        let mut child = Self::wrap(cmd)?;
        child.send_prompt(prompt).await?;
        Ok(child)
    }

    /// Wrap any command that writes stream-json to stdout.
    pub(crate) fn wrap(mut cmd: Command) -> Result<Self> {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("claude stdout was not captured".into()))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text).await;
                text
            })
        });

        Ok(Self {
            child,
            stdout: BufReader::new(stdout).lines(),
            stderr,
        })
    }

    async fn send_prompt(&mut self, prompt: &str) -> Result<()> {
        let message = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{ "type": "text", "text": prompt }]
            }
        });
        let mut line = message.to_string();
        line.push('\n');

        // Taking stdin drops it after the write, which closes the pipe.
        let mut stdin = self
            .child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Process("claude stdin was not captured".into()))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// The next event, or `None` at EOF. Blank lines and events of an
    /// unlisted type are skipped.
    pub(crate) async fn next_event(&mut self) -> Result<Option<StreamEvent>> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<StreamEvent>(line) {
                Ok(event) => return Ok(Some(event)),
                Err(_) if is_unlisted_type(line) => {
                    tracing::trace!(line, "skipping unlisted stream event");
                }
                Err(source) => {
                    return Err(AgentError::Parse {
                        line: line.to_string(),
                        source,
                    })
                }
            }
        }
        Ok(None)
    }

    /// Reap the process. A failed exit becomes an error carrying stderr.
    pub(crate) async fn exit_error(&mut self) -> Option<AgentError> {
        let status = match self.child.wait().await {
            Ok(status) => status,
            Err(e) => return Some(AgentError::Io(e)),
        };
        if status.success() {
            return None;
        }

        let stderr = match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let mut message = match status.code() {
            Some(code) => format!("claude exited with code {code}"),
            None => "claude was killed by a signal".to_string(),
        };
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            message.push_str("\nstderr: ");
            message.push_str(stderr);
        }
        Some(AgentError::Process(message))
    }
}

/// Event types [`StreamEvent`] models. A malformed one of these is an error,
/// never skipped.
const LISTED_TYPES: [&str; 4] = ["system", "assistant", "user", "result"];

/// Parses as JSON and carries a `"type"` outside [`LISTED_TYPES`].
fn is_unlisted_type(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("type")?.as_str().map(str::to_owned))
        .is_some_and(|t| !LISTED_TYPES.contains(&t.as_str()))
}

/// Arguments for `claude`. The prompt travels over stdin, not argv.
pub(crate) fn launch_args(launch: &Launch) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--print".into(),
        "--verbose".into(),
        "--input-format".into(),
        "stream-json".into(),
        "--output-format".into(),
        "stream-json".into(),
    ];

    if let Some(model) = &launch.model {
        args.extend(["--model".into(), model.clone()]);
    }
    if let Some(turns) = launch.max_turns {
        args.extend(["--max-turns".into(), turns.to_string()]);
    }
    if let Some(prompt) = &launch.system_prompt {
        args.extend(["--system-prompt".into(), prompt.clone()]);
    }
    if launch.dont_ask {
        args.extend(["--permission-mode".into(), "dontAsk".into()]);
    }
    if let Some(server) = &launch.mcp_server {
        args.extend(["--mcp-config".into(), server.config_json()]);
        args.push("--strict-mcp-config".into());
    }
    if !launch.allowed_tools.is_empty() {
        args.push("--allowed-tools".to_string());
        args.extend(launch.allowed_tools.iter().cloned());
    }
    args
}
