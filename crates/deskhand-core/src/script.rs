//! Subprocess boundary to the OS scripting interpreter.
//!
//! Every action renders an AppleScript source and hands it to a
//! [`ScriptRunner`]. The production runner is [`Interpreter`], which pipes the
//! source into `osascript -` and blocks until the interpreter exits.
//!
//! # Protocol
//! - stdin:  the full script source, then EOF
//! - stdout: the value of the last statement (returned to the caller)
//! - stderr: interpreter diagnostics (surfaced on non-zero exit)

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to start interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send script to interpreter: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("{}", failure_message(.code, .stderr))]
    Failed { code: Option<i32>, stderr: String },
}

fn failure_message(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(c) => format!("script exited with code {c}"),
        None => "script terminated by signal".to_string(),
    };
    if stderr.is_empty() {
        status
    } else {
        format!("{status}\nstderr: {stderr}")
    }
}

/// Anything that can execute a script source and return its stdout.
///
/// Implementations must surface a non-zero exit as [`ScriptError::Failed`];
/// callers rely on that to tell a failed UI step from an empty result.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, script: &str) -> Result<String, ScriptError>;
}

/// A scripting interpreter invoked as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    program: String,
    args: Vec<String>,
}

impl Interpreter {
    pub const DEFAULT_PROGRAM: &'static str = "osascript";

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `osascript -`, reading the script from stdin.
    pub fn osascript() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, vec!["-".into()])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// True if the interpreter binary resolves on `PATH` (or is an existing path).
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::osascript()
    }
}

impl ScriptRunner for Interpreter {
    fn run(&self, script: &str) -> Result<String, ScriptError> {
        tracing::debug!(program = %self.program, bytes = script.len(), "running script");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ScriptError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping stdin after the write closes the pipe so the interpreter sees EOF.
        // A failed exit takes precedence over a failed write.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(script.as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|source| ScriptError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(code = ?output.status.code(), %stderr, "script failed");
            return Err(ScriptError::Failed {
                code: output.status.code(),
                stderr,
            });
        }
        written.map_err(ScriptError::Stdin)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!("script step complete");
        Ok(stdout.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Render `value` as an AppleScript string literal, quotes included.
pub fn applescript_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> Interpreter {
        Interpreter::new("sh", vec!["-s".into()])
    }

    #[test]
    fn applescript_string_escapes_quotes_and_backslashes() {
        assert_eq!(applescript_string("plain"), "\"plain\"");
        assert_eq!(applescript_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(applescript_string(r"C:\dir"), r#""C:\\dir""#);
    }

    #[test]
    fn default_interpreter_is_osascript_stdin() {
        let i = Interpreter::default();
        assert_eq!(i.program(), "osascript");
        assert_eq!(i, Interpreter::new("osascript", vec!["-".into()]));
    }

    #[cfg(unix)]
    #[test]
    fn run_returns_stdout_without_trailing_newline() {
        let out = sh().run("echo hello").unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error_with_stderr() {
        let err = sh().run("echo broken >&2; exit 3").unwrap_err();
        match err {
            ScriptError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failure_message_includes_code_and_stderr() {
        let err = sh().run("echo nope >&2; exit 1").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_exit_code_not_broken_pipe() {
        // `sh -c` never reads stdin, so a large script hits a closed pipe.
        let i = Interpreter::new(
            "sh",
            vec!["-c".into(), "echo osa-err >&2; exit 5".into()],
        );
        let script = "x".repeat(4 * 1024 * 1024);
        match i.run(&script).unwrap_err() {
            ScriptError::Failed { code, stderr } => {
                assert_eq!(code, Some(5));
                assert_eq!(stderr, "osa-err");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let i = Interpreter::new("deskhand-no-such-interpreter", vec![]);
        assert!(!i.is_available());
        let err = i.run("anything").unwrap_err();
        assert!(matches!(err, ScriptError::Spawn { .. }));
    }
}
