//! Visual Studio Code actions driven through System Events keystrokes.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::no_args_schema;
use crate::action::{missing_arg, text_arg, Action, ActionError};
use crate::script::{applescript_string, ScriptRunner};

const RANGE_FORMAT_HINT: &str = "Invalid input format. Please use 'start_line:end_line'.";

// ---------------------------------------------------------------------------
// LineRange
// ---------------------------------------------------------------------------

/// An inclusive-start line selection. `span` is how many lines the cursor is
/// extended downwards from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start == 0 {
            return Err("Invalid line range: line numbers start at 1.".to_string());
        }
        if end < start {
            return Err(format!(
                "Invalid line range: end line {end} is before start line {start}."
            ));
        }
        Ok(Self { start, end })
    }

    pub fn span(&self) -> u32 {
        self.end - self.start
    }

    /// Accepts `"start:end"`, `{"range": "start:end"}` or
    /// `{"start_line": n, "end_line": m}`.
    pub fn from_args(args: &Value) -> Result<Self, String> {
        match args {
            Value::String(s) => s.parse(),
            Value::Object(map) => {
                if let Some(range) = map.get("range").and_then(Value::as_str) {
                    return range.parse();
                }
                let start = map.get("start_line").and_then(line_number);
                let end = map.get("end_line").and_then(line_number);
                match (start, end) {
                    (Some(start), Some(end)) => Self::new(start, end),
                    _ => Err(RANGE_FORMAT_HINT.to_string()),
                }
            }
            _ => Err(RANGE_FORMAT_HINT.to_string()),
        }
    }
}

fn line_number(v: &Value) -> Option<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| RANGE_FORMAT_HINT.to_string())?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| RANGE_FORMAT_HINT.to_string())?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| RANGE_FORMAT_HINT.to_string())?;
        Self::new(start, end)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

pub struct OpenFileByNameSearch;

impl Action for OpenFileByNameSearch {
    fn name(&self) -> &str {
        "open_vs_code_file_by_name_search"
    }

    fn description(&self) -> &str {
        "Executing this will do a name search in VS Code on the given input. Nothing extra \
         needs to be done. This requires no validation. Don't do anything extra after this step."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_name": {
                    "type": "string",
                    "description": "File name (or part of it) to type into Quick Open"
                }
            },
            "required": ["file_name"]
        })
    }

    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        let Some(file_name) = text_arg(args, "file_name").filter(|f| !f.trim().is_empty()) else {
            return Ok(missing_arg(self.name(), "file_name"));
        };

        let script = format!(
            r#"tell application "System Events"
    tell process "Code"
        delay 0.5
        key code 35 using {{command down}} -- Command+P
        delay 0.1
        keystroke {}
        delay 0.1
        key code 36 -- Enter
    end tell
end tell"#,
            applescript_string(file_name)
        );
        scripts.run(&script)?;
        Ok("file name search completed".to_string())
    }
}

pub struct SelectLines;

impl SelectLines {
    fn script(range: LineRange) -> String {
        format!(
            r#"tell application "Visual Studio Code"
    activate
end tell

delay 0.5

tell application "System Events"
    tell process "Code"
        -- Go to Line
        keystroke "g" using {{control down}}
        delay 0.1
        keystroke "{start}"
        delay 0.2
        keystroke return
        delay 0.2

        repeat {span} times
            key code 125 using {{shift down}} -- Shift+Down
            delay 0.05
        end repeat
    end tell
end tell"#,
            start = range.start,
            span = range.span()
        )
    }
}

impl Action for SelectLines {
    fn name(&self) -> &str {
        "select_lines_in_vs_code"
    }

    fn description(&self) -> &str {
        "Selects lines in Visual Studio Code based on the given input. The input should be a \
         string in the format \"start_line:end_line\". This requires no additional validation \
         or processing."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "range": {
                    "type": "string",
                    "description": "Line range in the form start_line:end_line, e.g. 10:15"
                },
                "start_line": { "type": "integer", "minimum": 1 },
                "end_line": { "type": "integer", "minimum": 1 }
            }
        })
    }

    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        let range = match LineRange::from_args(args) {
            Ok(r) => r,
            Err(msg) => return Ok(msg),
        };
        tracing::debug!(%range, span = range.span(), "selecting lines");
        scripts.run(&Self::script(range))?;
        Ok("lines have been selected".to_string())
    }
}

pub struct BringToForeground;

impl Action for BringToForeground {
    fn name(&self) -> &str {
        "bring_vs_code_to_foreground"
    }

    fn description(&self) -> &str {
        "Bring VS Code to the foreground."
    }

    fn schema(&self) -> Value {
        no_args_schema()
    }

    fn call(&self, _args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        scripts.run("tell application \"Visual Studio Code\"\n    activate\nend tell")?;
        Ok("vs code is now in the foreground".to_string())
    }
}
