//! Fixed prompt material sent with every generation request.

use serde::Serialize;

pub const SYSTEM_INSTRUCTION: &str =
    "Your task is to generate P&ID's symbols count for the user provided images";

pub const PERSONA_PROMPT: &str = r#"You are an AI assistant specialized in understanding and analyzing Piping and Instrumentation Diagrams (P&IDs). Your goal is to assist users in exploring and querying the diagram details interactively. You can provide information on material flows, symbol meanings, connections, and directions, as well as respond to specific queries about the diagram.

User can ask questions such as:

'Explain the material flow throughout the entire diagram.'
'Describe the direction of arrows between nitrogen and hot water storage.'
'Give me the count and display of the P&ID symbols and numbers.'
'Explain each P&ID symbol in detail.'
Your responses should be clear, concise, and accurate, pulling information from the diagram context. If symbols, flows, or connections are mentioned, provide detailed explanations of their roles and relationships within the diagram. Also, ensure you maintain a structured approach when walking the user through complex queries."#;

pub const SAMPLE_QUESTIONS: [&str; 4] = [
    "Give me the count and display of the P&ID symbols and numbers",
    "Describe the direction of arrows between nitrogen and hot water storage",
    "Can you Provide details of each P&ID symbol?",
    "Explain the material flow throughout the entire diagram",
];

/// System instruction, persona and sample questions. Built once at startup and
/// shared read-only across sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptContext {
    pub system_instruction: String,
    pub persona: String,
    pub sample_questions: Vec<String>,
}

impl PromptContext {
    /// Default context with the system instruction replaced, if one is given.
    pub fn with_system_instruction(instruction: Option<&str>) -> Self {
        let mut context = Self::default();
        if let Some(instruction) = instruction.filter(|s| !s.trim().is_empty()) {
            context.system_instruction = instruction.to_string();
        }
        context
    }

    /// Numbered list as shown in the sidebar.
    pub fn sample_questions_text(&self) -> String {
        self.sample_questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}\n", i + 1, q))
            .collect()
    }
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            persona: PERSONA_PROMPT.to_string(),
            sample_questions: SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_questions_text_is_numbered() {
        let text = PromptContext::default().sample_questions_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "2. Describe the direction of arrows between nitrogen and hot water storage"
        );
    }

    #[test]
    fn test_system_instruction_override() {
        let context = PromptContext::with_system_instruction(Some("Count valves only"));
        assert_eq!(context.system_instruction, "Count valves only");
        assert_eq!(context.persona, PERSONA_PROMPT);

        let context = PromptContext::with_system_instruction(Some("  "));
        assert_eq!(context.system_instruction, SYSTEM_INSTRUCTION);
    }
}
