//! Output channels for the agent's final answer.

use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DeskhandError, Result};
use crate::script::{applescript_string, ScriptRunner};

pub trait Relay: Send + Sync {
    fn relay(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelayKind {
    /// Speak through the OS text-to-speech (`say`).
    #[default]
    Speech,
    /// Print to stdout.
    Print,
    /// Log only.
    Silent,
}

impl RelayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayKind::Speech => "speech",
            RelayKind::Print => "print",
            RelayKind::Silent => "silent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "speech" | "say" | "voice" => Some(RelayKind::Speech),
            "print" | "stdout" => Some(RelayKind::Print),
            "silent" | "none" => Some(RelayKind::Silent),
            _ => None,
        }
    }

    pub fn build(self, scripts: Arc<dyn ScriptRunner>) -> Box<dyn Relay> {
        match self {
            RelayKind::Speech => Box::new(SpeechRelay::new(scripts)),
            RelayKind::Print => Box::new(PrintRelay),
            RelayKind::Silent => Box::new(SilentRelay),
        }
    }
}

/// Speaks the message with AppleScript `say`.
pub struct SpeechRelay {
    scripts: Arc<dyn ScriptRunner>,
}

impl SpeechRelay {
    pub fn new(scripts: Arc<dyn ScriptRunner>) -> Self {
        Self { scripts }
    }
}

impl Relay for SpeechRelay {
    fn relay(&self, message: &str) -> Result<()> {
        self.scripts
            .run(&format!("say {}", applescript_string(message)))
            .map_err(DeskhandError::Relay)?;
        Ok(())
    }
}

pub struct PrintRelay;

impl Relay for PrintRelay {
    fn relay(&self, message: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{message}")?;
        Ok(())
    }
}

pub struct SilentRelay;

impl Relay for SilentRelay {
    fn relay(&self, message: &str) -> Result<()> {
        tracing::info!(%message, "result");
        Ok(())
    }
}
