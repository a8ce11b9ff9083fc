use anyhow::{Context, Result};
use deskhand_core::ActionError;
use serde_json::Value;

use super::Workspace;
use crate::output::{print_json, print_table};

#[derive(clap::Subcommand)]
pub enum ActionsSubcommand {
    /// List the action catalog
    List {
        /// Output as JSON (name, description, schema)
        #[arg(long)]
        json: bool,
    },

    /// Invoke one action directly and print its result
    Call {
        /// Action name, e.g. chrome_open_url
        name: String,

        /// Primary argument as a plain string, e.g. a URL or "10:15"
        input: Option<String>,

        /// Full argument object as JSON
        #[arg(long, conflicts_with = "input")]
        json_input: Option<String>,
    },
}

pub fn run(ws: &Workspace, subcommand: ActionsSubcommand) -> Result<()> {
    let actions = ws.registry();
    match subcommand {
        ActionsSubcommand::List { json } => {
            if json {
                return print_json(&actions.specs());
            }
            let rows: Vec<Vec<String>> = actions
                .specs()
                .into_iter()
                .map(|s| vec![s.name, summary(&s.description)])
                .collect();
            print_table(&["NAME", "DESCRIPTION"], &rows);
            Ok(())
        }
        ActionsSubcommand::Call {
            name,
            input,
            json_input,
        } => {
            let args = match (json_input, input) {
                (Some(raw), _) => serde_json::from_str(&raw).context("--json-input is not valid JSON")?,
                (None, Some(text)) => Value::String(text),
                (None, None) => Value::Null,
            };
            let output = actions.invoke(&name, &args).map_err(|e| match e {
                ActionError::Unknown(_) => anyhow::anyhow!(
                    "unknown action '{name}' (see `deskhand actions list`)"
                ),
                other => anyhow::Error::new(other).context(format!("action '{name}' failed")),
            })?;
            println!("{output}");
            Ok(())
        }
    }
}

/// First sentence of a description, for the table view.
fn summary(description: &str) -> String {
    let first = description.split(". ").next().unwrap_or(description);
    first.trim_end_matches('.').to_string()
}
