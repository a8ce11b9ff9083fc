//! Google Chrome actions: navigation and JavaScript in the active tab.

use serde_json::Value;

use super::no_args_schema;
use crate::action::{missing_arg, text_arg, Action, ActionError};
use crate::script::{applescript_string, ScriptRunner};

const LINKS_JS: &str =
    r#"Array.from(document.querySelectorAll("a")).map(x => x.innerText + ": " + x.href).join(" - ")"#;
const PAGE_TEXT_JS: &str = "document.body.innerText";

/// Execute `javascript` in the active tab of the front Chrome window.
///
/// A source starting with `open ` is an AppleScript command the agent sent to
/// the wrong action; it is refused with a message instead of being executed.
pub fn run_javascript(javascript: &str, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
    if javascript.starts_with("open ") {
        return Ok("Invalid command, not javascript".to_string());
    }

    let script = format!(
        r#"tell application "Google Chrome"
    tell active tab of front window
        execute javascript {}
    end tell
end tell"#,
        applescript_string(javascript)
    );
    Ok(scripts.run(&script)?)
}

pub struct OpenUrl;

impl Action for OpenUrl {
    fn name(&self) -> &str {
        "chrome_open_url"
    }

    fn description(&self) -> &str {
        "Use this tool to open a URL in Chrome. It is recommended to use this tool before \
         doing any other actions on Chrome. The URL should be a string. For example: \
         https://gmail.com"
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL to open, e.g. https://gmail.com"
                }
            },
            "required": ["url"]
        })
    }

    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        let Some(url) = text_arg(args, "url").map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(missing_arg(self.name(), "url"));
        };

        let script = format!(
            "tell application \"Google Chrome\"\n    open location {}\nend tell",
            applescript_string(url)
        );
        let out = scripts.run(&script)?;
        if out.is_empty() {
            Ok(format!("opened {url}"))
        } else {
            Ok(out)
        }
    }
}

pub struct GetLinks;

impl Action for GetLinks {
    fn name(&self) -> &str {
        "chrome_get_the_links_on_the_page"
    }

    fn description(&self) -> &str {
        "Use this when you want to get the links on the current page. You should use this \
         before clicking on anything."
    }

    fn schema(&self) -> Value {
        no_args_schema()
    }

    fn call(&self, _args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        run_javascript(LINKS_JS, scripts)
    }
}

pub struct ClickOnLink;

impl Action for ClickOnLink {
    fn name(&self) -> &str {
        "chrome_click_on_link"
    }

    fn description(&self) -> &str {
        "Use this when you want to go to a link. The link should be a url from a previous \
         observation."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the link, taken from chrome_get_the_links_on_the_page"
                }
            },
            "required": ["url"]
        })
    }

    fn call(&self, args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        let Some(url) = text_arg(args, "url").map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(missing_arg(self.name(), "url"));
        };

        // A JSON string literal is also a valid JavaScript string literal.
        let literal = serde_json::to_string(url).unwrap_or_else(|_| format!("\"{url}\""));
        run_javascript(&format!("window.location.href = {literal}"), scripts)
    }
}

pub struct ReadPage;

impl Action for ReadPage {
    fn name(&self) -> &str {
        "chrome_read_the_page"
    }

    fn description(&self) -> &str {
        "Use this when you want to read the page."
    }

    fn schema(&self) -> Value {
        no_args_schema()
    }

    fn call(&self, _args: &Value, scripts: &dyn ScriptRunner) -> Result<String, ActionError> {
        run_javascript(PAGE_TEXT_JS, scripts)
    }
}
