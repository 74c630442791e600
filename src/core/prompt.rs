//! System prompt assembly.

/// Build the system prompt from the agent persona and an optional knowledge
/// base, which is wrapped in a tagged block so the model can tell grounding
/// material apart from instructions.
pub fn build_system_prompt(persona: &str, knowledge_base: Option<&str>) -> String {
    match knowledge_base {
        Some(knowledge) if !knowledge.trim().is_empty() => format!(
            "{persona}\n\nUse the following knowledge base to answer questions \
             when it is relevant:\n<knowledge_base>\n{knowledge}\n</knowledge_base>"
        ),
        _ => persona.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_only() {
        let prompt = build_system_prompt("You are a helpful assistant.", None);
        assert_eq!(prompt, "You are a helpful assistant.");
    }

    #[test]
    fn test_knowledge_base_is_wrapped() {
        let prompt = build_system_prompt("Persona.", Some("Facts about widgets."));
        assert!(prompt.starts_with("Persona."));
        assert!(prompt.contains("<knowledge_base>\nFacts about widgets.\n</knowledge_base>"));
    }

    #[test]
    fn test_blank_knowledge_base_is_ignored() {
        let prompt = build_system_prompt("Persona.", Some("   \n"));
        assert_eq!(prompt, "Persona.");
    }
}
