use anyhow::{Context, Result};
use deskhand_agent::{ChatCompletionsPlanner, ClaudeCliPlanner};
use deskhand_core::{BackendKind, Dispatcher, Planner};

use super::Workspace;

/// Hand one natural-language command to the configured agent and relay the
/// answer.
pub fn run(ws: &Workspace, command: &str) -> Result<()> {
    let planner = build_planner(ws)?;
    let actions = ws.registry();
    let relay = ws.settings.relay.build(actions.scripts());
    let dispatcher = Dispatcher::new(planner, actions, relay);

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let dispatch = rt.block_on(dispatcher.run(command))?;

    if dispatch.outcome.stopped_early {
        tracing::warn!(steps = dispatch.outcome.steps, "agent stopped before finishing");
    }
    tracing::info!(relayed = %dispatch.relayed, "done");
    Ok(())
}

fn build_planner(ws: &Workspace) -> Result<Box<dyn Planner>> {
    let agent = &ws.settings.agent;
    match agent.backend {
        BackendKind::Openai => {
            let api_key = agent.api_key(&ws.env)?;
            Ok(Box::new(ChatCompletionsPlanner::from_settings(agent, api_key)))
        }
        BackendKind::ClaudeCli => {
            // The CLI connects back to this binary's `mcp` subcommand.
            let exe = std::env::current_exe().context("cannot locate the deskhand executable")?;
            let mut planner = ClaudeCliPlanner::from_settings(
                agent,
                exe.to_string_lossy().into_owned(),
                ws.mcp_args(),
            );
            // Optional: the CLI may already be logged in.
            let var = agent.api_key_env();
            if let Some(key) = ws.env.lookup(var) {
                planner = planner.with_env(var, key);
            }
            Ok(Box::new(planner))
        }
    }
}
