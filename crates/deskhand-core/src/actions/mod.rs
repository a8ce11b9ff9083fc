//! The built-in action catalog.

use crate::action::Action;

pub mod chrome;
pub mod system;
pub mod vscode;

pub fn all_actions() -> Vec<Box<dyn Action>> {
    vec![
        Box::new(system::AppleScriptAction),
        Box::new(chrome::OpenUrl),
        Box::new(chrome::GetLinks),
        Box::new(chrome::ClickOnLink),
        Box::new(chrome::ReadPage),
        Box::new(system::HelloWorld),
        Box::new(vscode::OpenFileByNameSearch),
        Box::new(vscode::SelectLines),
        Box::new(vscode::BringToForeground),
    ]
}

/// Schema for actions that take no arguments.
pub(crate) fn no_args_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}
