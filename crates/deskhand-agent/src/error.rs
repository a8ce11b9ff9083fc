use deskhand_core::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed agent response: {0}")]
    Malformed(String),

    #[error("unreadable stream-json line ({source}): {line}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("claude process: {0}")]
    Process(String),
}

impl AgentError {
    /// Wrap as a planner failure attributed to `backend`.
    pub fn into_plan(self, backend: &str) -> PlanError {
        PlanError::backend(backend, self.to_string())
    }
}
