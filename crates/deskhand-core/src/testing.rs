use std::sync::Mutex;

use crate::script::{ScriptError, ScriptRunner};

/// Records every script and answers with a fixed reply.
pub(crate) struct FakeRunner {
    pub scripts: Mutex<Vec<String>>,
    reply: Result<String, (Option<i32>, String)>,
}

impl FakeRunner {
    pub fn replying(reply: &str) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            reply: Ok(reply.to_string()),
        }
    }

    pub fn failing(code: i32, stderr: &str) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            reply: Err((Some(code), stderr.to_string())),
        }
    }

    pub fn last_script(&self) -> String {
        self.scripts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

impl ScriptRunner for FakeRunner {
    fn run(&self, script: &str) -> Result<String, ScriptError> {
        self.scripts.lock().unwrap().push(script.to_string());
        match &self.reply {
            Ok(s) => Ok(s.clone()),
            Err((code, stderr)) => Err(ScriptError::Failed {
                code: *code,
                stderr: stderr.clone(),
            }),
        }
    }
}
