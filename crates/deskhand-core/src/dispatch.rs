//! Command dispatcher: one command in, one relayed answer out.

use crate::action::ActionRegistry;
use crate::error::{DeskhandError, Result};
use crate::planner::{PlanOutcome, Planner};
use crate::relay::Relay;

/// What a completed dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub outcome: PlanOutcome,
    /// The message handed to the relay.
    pub relayed: String,
}

pub struct Dispatcher {
    planner: Box<dyn Planner>,
    actions: ActionRegistry,
    relay: Box<dyn Relay>,
}

impl Dispatcher {
    pub fn new(planner: Box<dyn Planner>, actions: ActionRegistry, relay: Box<dyn Relay>) -> Self {
        Self {
            planner,
            actions,
            relay,
        }
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Run `command` through the planner once and relay the answer.
    ///
    /// No retry and no timeout: the call is bounded only by the planner's own
    /// step limit. Planner failures propagate and nothing is relayed.
    pub async fn run(&self, command: &str) -> Result<Dispatch> {
        let command = command.trim();
        if command.is_empty() {
            return Err(DeskhandError::EmptyCommand);
        }

        tracing::info!(planner = self.planner.name(), %command, "Running AI with input");
        let outcome = self.planner.run(command, &self.actions).await?;
        tracing::info!(
            steps = outcome.steps,
            stopped_early = outcome.stopped_early,
            "agent finished"
        );

        let relayed = relay_message(command, &outcome.text);
        self.relay.relay(&relayed)?;

        Ok(Dispatch { outcome, relayed })
    }
}

/// `The result is <text>`, or a generic completion message for an empty answer.
pub fn relay_message(command: &str, result: &str) -> String {
    let result = result.trim();
    if result.is_empty() {
        format!("Finished doing {command}")
    } else {
        format!("The result is {result}")
    }
}
