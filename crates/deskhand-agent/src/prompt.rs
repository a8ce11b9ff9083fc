use deskhand_core::ActionRegistry;

const PREAMBLE: &str = "You are a helpful assistant that can perform actions and answer user commands. \
When you've completed all necessary actions, summarize your final result. \
Always respond concisely and accurately.";

/// System prompt: the fixed preamble followed by the action catalog.
pub fn system_prompt(actions: &ActionRegistry) -> String {
    let mut prompt = String::from(PREAMBLE);
    if actions.is_empty() {
        return prompt;
    }
    prompt.push_str("\n\nAvailable actions:\n");
    for spec in actions.specs() {
        prompt.push_str(&format!("- {}: {}\n", spec.name, spec.description));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskhand_core::Interpreter;
    use std::sync::Arc;

    #[test]
    fn prompt_lists_every_action() {
        let actions = ActionRegistry::standard(Arc::new(Interpreter::default()));
        let prompt = system_prompt(&actions);
        assert!(prompt.starts_with("You are a helpful assistant"));
        for name in actions.names() {
            assert!(prompt.contains(&format!("- {name}: ")), "missing {name}");
        }
    }

    #[test]
    fn empty_registry_is_preamble_only() {
        let actions = ActionRegistry::empty(Arc::new(Interpreter::default()));
        assert_eq!(system_prompt(&actions), PREAMBLE);
    }
}
